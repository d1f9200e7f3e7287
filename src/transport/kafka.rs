use crate::config::KafkaConfig;
use crate::error::{Context, Result};
use crate::transport::broker::payload_to_bytes;
use crate::transport::kafka_context::{KafkaConnectivityState, StatusProducerContext};
use crate::transport::{
    EventPublisher, OutboundMessage, PublishError, PublisherFactory, EVENT_TYPE_HEADER,
};
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use std::sync::Arc;
use std::time::Duration;

/// Creates one Kafka producer per publish batch.
#[derive(Clone, Debug)]
pub struct KafkaPublisherFactory {
    config: KafkaConfig,
    message_timeout: Duration,
}

impl KafkaPublisherFactory {
    pub fn new(config: &KafkaConfig) -> Result<Self> {
        let message_timeout = config
            .message_timeout()
            .context("invalid kafka message timeout")?;
        Ok(Self {
            config: config.clone(),
            message_timeout,
        })
    }
}

#[async_trait]
impl PublisherFactory for KafkaPublisherFactory {
    async fn connect(&self) -> std::result::Result<Box<dyn EventPublisher>, PublishError> {
        let brokers = self.config.brokers.join(",");
        let timeout_ms = self.message_timeout.as_millis().to_string();
        let state = Arc::new(KafkaConnectivityState::default());
        let context = StatusProducerContext::new(self.config.client_id.clone(), state.clone());

        let producer: FutureProducer<StatusProducerContext> = ClientConfig::new()
            .set("bootstrap.servers", brokers.as_str())
            .set("client.id", self.config.client_id.as_str())
            .set("message.timeout.ms", timeout_ms.as_str())
            .create_with_context(context)
            .map_err(|err| {
                PublishError::connect(format!(
                    "failed to create producer (brokers={brokers}): {err}"
                ))
            })?;

        tracing::debug!(brokers = %brokers, "kafka status producer created");

        Ok(Box::new(KafkaEventPublisher {
            producer: Some(producer),
            state,
            client_id: self.config.client_id.clone(),
            message_timeout: self.message_timeout,
        }))
    }
}

pub struct KafkaEventPublisher {
    producer: Option<FutureProducer<StatusProducerContext>>,
    state: Arc<KafkaConnectivityState>,
    client_id: String,
    message_timeout: Duration,
}

#[async_trait]
impl EventPublisher for KafkaEventPublisher {
    async fn publish(
        &mut self,
        message: &OutboundMessage,
    ) -> std::result::Result<(), PublishError> {
        let producer = self
            .producer
            .as_ref()
            .ok_or_else(|| PublishError::publish(message, "publisher already closed"))?;

        let payload = payload_to_bytes(&message.payload)?;
        let mut headers = OwnedHeaders::new().insert(Header {
            key: EVENT_TYPE_HEADER,
            value: Some(message.event.as_str()),
        });
        for (key, value) in &message.headers {
            headers = headers.insert(Header {
                key: key.as_str(),
                value: Some(value.as_str()),
            });
        }

        let record: FutureRecord<'_, (), Vec<u8>> = FutureRecord::to(message.service.as_str())
            .payload(&payload)
            .headers(headers);

        let (partition, offset) = producer
            .send(record, self.message_timeout)
            .await
            .map_err(|(err, _)| PublishError::publish(message, err.to_string()))?;

        if self.state.mark_connected() {
            tracing::info!(
                event = "transport_reconnected",
                client_id = %self.client_id,
            );
        }
        tracing::debug!(
            topic = %message.service,
            event_type = %message.event,
            partition,
            offset,
            "status message delivered"
        );
        Ok(())
    }

    async fn close(&mut self) -> std::result::Result<(), PublishError> {
        let Some(producer) = self.producer.take() else {
            return Ok(());
        };
        let timeout = self.message_timeout;
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|err| PublishError::close(err.to_string()))?
            .map_err(|err| PublishError::close(err.to_string()))
    }
}
