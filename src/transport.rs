use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

pub mod broker;
#[cfg(feature = "kafka")]
pub mod kafka;
#[cfg(feature = "kafka")]
pub mod kafka_context;

/// Topic identifier for source status change messages.
pub const STATUS_SERVICE: &str = "platform.sources.status";
/// Event name identifying an availability status change.
pub const AVAILABILITY_STATUS_EVENT: &str = "availability_status";
/// Header carrying the event name alongside the payload.
pub const EVENT_TYPE_HEADER: &str = "event_type";

/// One message destined for the event bus.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundMessage {
    pub service: String,
    pub event: String,
    pub payload: JsonValue,
    pub headers: Vec<(String, String)>,
}

impl OutboundMessage {
    pub fn new(service: impl Into<String>, event: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            service: service.into(),
            event: event.into(),
            payload,
            headers: Vec::new(),
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }
}

/// A connected messaging client. Callers must `close` it once a batch is done.
#[async_trait]
pub trait EventPublisher: Send {
    async fn publish(&mut self, message: &OutboundMessage) -> Result<(), PublishError>;

    async fn close(&mut self) -> Result<(), PublishError>;
}

/// Hands out a fresh publisher for each batch of messages.
#[async_trait]
pub trait PublisherFactory: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn EventPublisher>, PublishError>;
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to connect publisher: {reason}")]
    Connect { reason: String },
    #[error("failed to publish `{event}` to `{service}`: {reason}")]
    Publish {
        service: String,
        event: String,
        reason: String,
    },
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to close publisher: {reason}")]
    Close { reason: String },
}

impl PublishError {
    pub fn connect(reason: impl Into<String>) -> Self {
        PublishError::Connect {
            reason: reason.into(),
        }
    }

    pub fn publish(message: &OutboundMessage, reason: impl Into<String>) -> Self {
        PublishError::Publish {
            service: message.service.clone(),
            event: message.event.clone(),
            reason: reason.into(),
        }
    }

    pub fn close(reason: impl Into<String>) -> Self {
        PublishError::Close {
            reason: reason.into(),
        }
    }
}
