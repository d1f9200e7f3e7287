use crate::availability::context::CheckContext;
use crate::domain::{CheckResult, CheckTime, ResourceType};
use crate::metrics::metrics;
use crate::sources_api::{AvailabilityPatch, SourcesApi};
use crate::transport::broker::publish_with_metrics;
use crate::transport::{
    EventPublisher, OutboundMessage, PublisherFactory, AVAILABILITY_STATUS_EVENT, STATUS_SERVICE,
};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

const PUBLISH_TRANSPORT: &str = "status-bus";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropagationMode {
    Direct,
    Event,
}

impl PropagationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PropagationMode::Direct => "direct",
            PropagationMode::Event => "event",
        }
    }
}

impl fmt::Display for PropagationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How results leave the process, chosen once at startup.
#[derive(Clone)]
pub enum Propagation {
    /// Patch each record through the Sources API.
    Direct,
    /// Publish one status message per record on the event bus.
    Event(Arc<dyn PublisherFactory>),
}

impl Propagation {
    pub fn mode(&self) -> PropagationMode {
        match self {
            Propagation::Direct => PropagationMode::Direct,
            Propagation::Event(_) => PropagationMode::Event,
        }
    }
}

impl fmt::Debug for Propagation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Propagation").field(&self.mode()).finish()
    }
}

/// One record the result is written to.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Target {
    resource: ResourceType,
    id: String,
}

/// Writes a check result to the source and whichever sub-resources the run found.
///
/// Failures are logged and counted per record; they never stop the remaining records
/// from being updated.
pub struct PropagationDispatcher<'a> {
    propagation: &'a Propagation,
    api: &'a dyn SourcesApi,
}

impl<'a> PropagationDispatcher<'a> {
    pub fn new(propagation: &'a Propagation, api: &'a dyn SourcesApi) -> Self {
        Self { propagation, api }
    }

    pub async fn propagate(
        &self,
        context: &CheckContext,
        result: &CheckResult,
        check_time: CheckTime,
    ) {
        let targets = targets(context);
        match self.propagation {
            Propagation::Direct => {
                self.update_directly(context, &targets, result, check_time)
                    .await
            }
            Propagation::Event(factory) => {
                publish_events(factory.as_ref(), context, &targets, result).await
            }
        }
    }

    async fn update_directly(
        &self,
        context: &CheckContext,
        targets: &[Target],
        result: &CheckResult,
        check_time: CheckTime,
    ) {
        let mode = PropagationMode::Direct.as_str();
        let status = result.status;
        for target in targets {
            let outcome = match target.resource {
                ResourceType::Source => {
                    let patch = AvailabilityPatch::for_source(status, check_time);
                    self.api.update_source(&target.id, &patch).await
                }
                ResourceType::Endpoint => {
                    let patch = AvailabilityPatch::for_endpoint(
                        status,
                        result.error_message.as_deref(),
                        check_time,
                    );
                    self.api.update_endpoint(&target.id, &patch).await
                }
                ResourceType::Application => {
                    let patch = AvailabilityPatch::for_application(status, check_time);
                    self.api.update_application(&target.id, &patch).await
                }
            };

            match outcome {
                Ok(()) => metrics().record_propagation_success(target.resource, mode),
                Err(err) => {
                    metrics().record_propagation_failure(target.resource, mode);
                    crate::availability_event!(
                        error,
                        "availability_check.update_failed",
                        source = context.source_id(),
                        resource = target.resource,
                        resource_id = target.id,
                        error = err,
                    );
                }
            }
        }
    }
}

fn targets(context: &CheckContext) -> Vec<Target> {
    let mut targets = vec![Target {
        resource: ResourceType::Source,
        id: context.source_id().to_string(),
    }];
    if let Some(endpoint) = context.endpoint.as_ref() {
        targets.push(Target {
            resource: ResourceType::Endpoint,
            id: endpoint.id.clone(),
        });
    }
    if let Some(application) = context.application.as_ref() {
        targets.push(Target {
            resource: ResourceType::Application,
            id: application.id.clone(),
        });
    }
    targets
}

fn status_message(
    context: &CheckContext,
    target: &Target,
    result: &CheckResult,
) -> OutboundMessage {
    let mut payload = json!({
        "resource_type": target.resource.as_str(),
        "resource_id": target.id,
        "status": result.status.as_str(),
    });
    if target.resource == ResourceType::Endpoint {
        payload["error"] = json!(result.error_message);
    }

    OutboundMessage::new(STATUS_SERVICE, AVAILABILITY_STATUS_EVENT, payload)
        .with_headers(context.identity_headers().to_vec())
}

/// Publishes the batch on a freshly connected publisher and always closes it afterwards.
async fn publish_events(
    factory: &dyn PublisherFactory,
    context: &CheckContext,
    targets: &[Target],
    result: &CheckResult,
) {
    let mode = PropagationMode::Event.as_str();
    let mut publisher = match factory.connect().await {
        Ok(publisher) => publisher,
        Err(err) => {
            for target in targets {
                metrics().record_propagation_failure(target.resource, mode);
            }
            crate::availability_event!(
                error,
                "availability_check.publisher_unavailable",
                source = context.source_id(),
                error = err,
            );
            return;
        }
    };

    publish_batch(publisher.as_mut(), context, targets, result).await;

    if let Err(err) = publisher.close().await {
        crate::availability_event!(
            warn,
            "availability_check.publisher_close_failed",
            source = context.source_id(),
            error = err,
        );
    }
}

async fn publish_batch(
    publisher: &mut dyn EventPublisher,
    context: &CheckContext,
    targets: &[Target],
    result: &CheckResult,
) {
    let mode = PropagationMode::Event.as_str();
    for target in targets {
        let message = status_message(context, target, result);
        match publish_with_metrics(PUBLISH_TRANSPORT, publisher, &message).await {
            Ok(()) => metrics().record_propagation_success(target.resource, mode),
            Err(err) => {
                metrics().record_propagation_failure(target.resource, mode);
                crate::availability_event!(
                    error,
                    "availability_check.publish_failed",
                    source = context.source_id(),
                    resource = target.resource,
                    resource_id = target.id,
                    error = err,
                );
            }
        }
    }
}
