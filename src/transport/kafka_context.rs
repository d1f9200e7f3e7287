#![forbid(unsafe_code)]

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rdkafka::client::ClientContext;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::error::KafkaError;

/// Tracks whether the client has reported a broker error so repeated errors log once at warn.
#[derive(Debug, Default)]
pub struct KafkaConnectivityState {
    disconnected: AtomicBool,
}

impl KafkaConnectivityState {
    pub fn mark_disconnected(&self) -> bool {
        !self.disconnected.swap(true, Ordering::SeqCst)
    }

    pub fn mark_connected(&self) -> bool {
        self.disconnected.swap(false, Ordering::SeqCst)
    }
}

#[derive(Clone, Debug)]
pub struct StatusProducerContext {
    client_id: String,
    state: Arc<KafkaConnectivityState>,
}

impl StatusProducerContext {
    pub fn new(client_id: impl Into<String>, state: Arc<KafkaConnectivityState>) -> Self {
        Self {
            client_id: client_id.into(),
            state,
        }
    }
}

impl ClientContext for StatusProducerContext {
    fn log(&self, _level: RDKafkaLogLevel, _facility: &str, _message: &str) {
        // Broker connectivity problems arrive through `error`.
    }

    fn error(&self, error: KafkaError, reason: &str) {
        if self.state.mark_disconnected() {
            tracing::warn!(
                event = "rdkafka_client_error",
                client_id = %self.client_id,
                error = %error,
                reason = %reason,
            );
        } else {
            tracing::debug!(
                event = "rdkafka_client_error",
                client_id = %self.client_id,
                error = %error,
                reason = %reason,
            );
        }
    }
}
