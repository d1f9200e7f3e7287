#![forbid(unsafe_code)]

use crate::transport::{EventPublisher, OutboundMessage, PublishError};
use metrics::{Key, Label, Level, Metadata};
use serde_json::Value as JsonValue;
use std::time::{Duration, Instant};

pub fn payload_to_bytes(payload: &JsonValue) -> Result<Vec<u8>, PublishError> {
    match payload {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::String(text) => Ok(text.as_bytes().to_vec()),
        other => Ok(serde_json::to_vec(other)?),
    }
}

/// Publishes through `publisher`, recording the outcome in the runtime counters and the
/// `metrics` recorder.
pub async fn publish_with_metrics(
    transport: &'static str,
    publisher: &mut dyn EventPublisher,
    message: &OutboundMessage,
) -> Result<(), PublishError> {
    let start = Instant::now();
    let result = publisher.publish(message).await;
    match result.as_ref() {
        Ok(_) => {
            crate::metrics::metrics().inc_publish_success();
            record_publish_metrics(transport, "success", start.elapsed());
        }
        Err(_) => {
            crate::metrics::metrics().inc_publish_failure();
            record_publish_metrics(transport, "error", start.elapsed());
        }
    }
    result
}

fn record_publish_metrics(transport: &str, status: &str, elapsed: Duration) {
    let labels = vec![
        Label::new("transport", transport.to_owned()),
        Label::new("status", status.to_owned()),
    ];

    let counter_key = Key::from_parts("availability_publish_total", labels.clone());
    let histogram_key = Key::from_parts("availability_publish_elapsed_ms", labels);
    let metadata = Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

    metrics::with_recorder(|recorder| {
        recorder
            .register_counter(&counter_key, &metadata)
            .increment(1);
        recorder
            .register_histogram(&histogram_key, &metadata)
            .record(elapsed.as_secs_f64() * 1000.0);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_bytes_keep_strings_verbatim() {
        assert_eq!(payload_to_bytes(&json!("raw")).unwrap(), b"raw".to_vec());
        assert!(payload_to_bytes(&JsonValue::Null).unwrap().is_empty());
        let encoded = payload_to_bytes(&json!({ "status": "available" })).unwrap();
        assert_eq!(encoded, br#"{"status":"available"}"#.to_vec());
    }
}
