#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use source_availability::availability::Clock;
use source_availability::domain::{
    Application, Authentication, AvailabilityStatus, Endpoint, ResourceType,
};
use source_availability::probe::{ConnectivityProbe, ProbeError, ProbeOutcome};
use source_availability::sources_api::{ApiError, AvailabilityPatch, SourcesApi};
use source_availability::transport::{
    EventPublisher, OutboundMessage, PublishError, PublisherFactory,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 15, 0).unwrap()
}

/// Clock pinned to one instant.
#[derive(Clone, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(fixed_now())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiCall {
    GetEndpoint(String),
    GetApplication(String),
    GetAuthentication(String),
    Update {
        resource: ResourceType,
        id: String,
        patch: AvailabilityPatch,
    },
}

#[derive(Default)]
struct ApiState {
    endpoint: Option<Endpoint>,
    application: Option<Application>,
    authentication: Option<Authentication>,
    failing_lookups: HashSet<&'static str>,
    failing_updates: HashSet<ResourceType>,
    calls: Vec<ApiCall>,
}

/// In-memory Sources API recording every call it receives.
#[derive(Clone, Default)]
pub struct MockSourcesApi {
    inner: Arc<Mutex<ApiState>>,
}

impl MockSourcesApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(self, endpoint: Endpoint) -> Self {
        self.inner.lock().expect("api state").endpoint = Some(endpoint);
        self
    }

    pub fn with_application(self, application: Application) -> Self {
        self.inner.lock().expect("api state").application = Some(application);
        self
    }

    pub fn with_authentication(self, authentication: Authentication) -> Self {
        self.inner.lock().expect("api state").authentication = Some(authentication);
        self
    }

    /// Makes `get_endpoint`, `get_application` or `get_authentication` fail.
    pub fn failing_lookup(self, lookup: &'static str) -> Self {
        self.inner
            .lock()
            .expect("api state")
            .failing_lookups
            .insert(lookup);
        self
    }

    pub fn failing_update(self, resource: ResourceType) -> Self {
        self.inner
            .lock()
            .expect("api state")
            .failing_updates
            .insert(resource);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner.lock().expect("api state").calls.clone()
    }

    pub fn updates(&self) -> Vec<(ResourceType, String, AvailabilityPatch)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Update {
                    resource,
                    id,
                    patch,
                } => Some((resource, id, patch)),
                _ => None,
            })
            .collect()
    }

    pub fn update_for(&self, resource: ResourceType) -> Option<AvailabilityPatch> {
        self.updates()
            .into_iter()
            .find(|(kind, _, _)| *kind == resource)
            .map(|(_, _, patch)| patch)
    }

    fn lookup<T: Clone>(
        &self,
        name: &'static str,
        call: ApiCall,
        pick: impl FnOnce(&ApiState) -> Option<T>,
    ) -> Result<Option<T>, ApiError> {
        let mut inner = self.inner.lock().expect("api state");
        inner.calls.push(call);
        if inner.failing_lookups.contains(name) {
            return Err(ApiError::status(format!("mock://{name}"), 500, "lookup failed"));
        }
        Ok(pick(&*inner))
    }

    fn update(
        &self,
        resource: ResourceType,
        id: &str,
        patch: &AvailabilityPatch,
    ) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().expect("api state");
        inner.calls.push(ApiCall::Update {
            resource,
            id: id.to_string(),
            patch: patch.clone(),
        });
        if inner.failing_updates.contains(&resource) {
            return Err(ApiError::status(
                format!("mock://{}/{id}", resource.as_str()),
                422,
                "update rejected",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SourcesApi for MockSourcesApi {
    async fn get_endpoint(&self, source_id: &str) -> Result<Option<Endpoint>, ApiError> {
        self.lookup(
            "get_endpoint",
            ApiCall::GetEndpoint(source_id.to_string()),
            |state| state.endpoint.clone(),
        )
    }

    async fn get_application(&self, source_id: &str) -> Result<Option<Application>, ApiError> {
        self.lookup(
            "get_application",
            ApiCall::GetApplication(source_id.to_string()),
            |state| state.application.clone(),
        )
    }

    async fn get_authentication(
        &self,
        endpoint_id: &str,
    ) -> Result<Option<Authentication>, ApiError> {
        self.lookup(
            "get_authentication",
            ApiCall::GetAuthentication(endpoint_id.to_string()),
            |state| state.authentication.clone(),
        )
    }

    async fn update_source(&self, id: &str, patch: &AvailabilityPatch) -> Result<(), ApiError> {
        self.update(ResourceType::Source, id, patch)
    }

    async fn update_endpoint(&self, id: &str, patch: &AvailabilityPatch) -> Result<(), ApiError> {
        self.update(ResourceType::Endpoint, id, patch)
    }

    async fn update_application(
        &self,
        id: &str,
        patch: &AvailabilityPatch,
    ) -> Result<(), ApiError> {
        self.update(ResourceType::Application, id, patch)
    }
}

/// Probe returning a fixed outcome and counting its invocations.
#[derive(Clone)]
pub struct ScriptedProbe {
    outcome: ProbeOutcome,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl ScriptedProbe {
    pub fn available() -> Self {
        Self::returning(ProbeOutcome::available())
    }

    pub fn unavailable(message: &str) -> Self {
        Self::returning(ProbeOutcome::unavailable(message))
    }

    pub fn returning(outcome: ProbeOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `(endpoint id, authentication id)` for every probe call.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().expect("probe calls").clone()
    }
}

#[async_trait]
impl ConnectivityProbe for ScriptedProbe {
    async fn probe(
        &self,
        endpoint: &Endpoint,
        authentication: &Authentication,
    ) -> Result<ProbeOutcome, ProbeError> {
        self.calls
            .lock()
            .expect("probe calls")
            .push((endpoint.id.clone(), authentication.id.clone()));
        Ok(self.outcome.clone())
    }
}

#[derive(Default)]
struct BusState {
    connects: usize,
    closes: usize,
    published: Vec<OutboundMessage>,
    fail_connect: bool,
    fail_close: bool,
    fail_resource_types: HashSet<String>,
}

/// Event bus double: hands out publishers that record into shared state.
#[derive(Clone, Default)]
pub struct RecordingBus {
    inner: Arc<Mutex<BusState>>,
}

impl RecordingBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_connect(self) -> Self {
        self.inner.lock().expect("bus state").fail_connect = true;
        self
    }

    pub fn failing_close(self) -> Self {
        self.inner.lock().expect("bus state").fail_close = true;
        self
    }

    /// Rejects messages whose payload `resource_type` matches.
    pub fn failing_resource(self, resource: ResourceType) -> Self {
        self.inner
            .lock()
            .expect("bus state")
            .fail_resource_types
            .insert(resource.as_str().to_string());
        self
    }

    pub fn published(&self) -> Vec<OutboundMessage> {
        self.inner.lock().expect("bus state").published.clone()
    }

    pub fn connects(&self) -> usize {
        self.inner.lock().expect("bus state").connects
    }

    pub fn closes(&self) -> usize {
        self.inner.lock().expect("bus state").closes
    }
}

#[async_trait]
impl PublisherFactory for RecordingBus {
    async fn connect(&self) -> Result<Box<dyn EventPublisher>, PublishError> {
        let mut inner = self.inner.lock().expect("bus state");
        if inner.fail_connect {
            return Err(PublishError::connect("broker unreachable"));
        }
        inner.connects += 1;
        Ok(Box::new(RecordingPublisher { bus: self.clone() }))
    }
}

pub struct RecordingPublisher {
    bus: RecordingBus,
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&mut self, message: &OutboundMessage) -> Result<(), PublishError> {
        let mut inner = self.bus.inner.lock().expect("bus state");
        let resource_type = message.payload["resource_type"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        if inner.fail_resource_types.contains(&resource_type) {
            return Err(PublishError::publish(message, "delivery timed out"));
        }
        inner.published.push(message.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PublishError> {
        let mut inner = self.bus.inner.lock().expect("bus state");
        inner.closes += 1;
        if inner.fail_close {
            return Err(PublishError::close("flush timed out"));
        }
        Ok(())
    }
}

pub fn endpoint(id: &str) -> Endpoint {
    let mut endpoint = Endpoint::new(id);
    endpoint.host = Some("cloud.example.com".to_string());
    endpoint.port = Some(443);
    endpoint
}

pub fn application(id: &str, status: &str) -> Application {
    let mut application = Application::new(id);
    application.availability_status = Some(status.to_string());
    application
}

pub fn status_of(patch: &AvailabilityPatch) -> Option<AvailabilityStatus> {
    patch.availability_status
}
