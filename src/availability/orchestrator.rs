use crate::availability::context::{CheckContext, Clock, SystemClock};
use crate::availability::propagation::{Propagation, PropagationDispatcher};
use crate::availability::recency::checked_recently;
use crate::availability::resolver::ConnectivityResolver;
use crate::availability::resources::ResourceAccessor;
use crate::availability::AvailabilityError;
use crate::domain::{CheckRequest, CheckResult, CheckTime, ResourceType};
use crate::identity::{identity_headers, AccountIdentityResolver, IdentityResolver};
use crate::metrics::metrics;
use crate::probe::ConnectivityProbe;
use crate::sources_api::SourcesApi;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// Terminal state of one availability check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    Error,
    Skipped,
    Success,
}

impl CheckOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckOutcome::Error => "error",
            CheckOutcome::Skipped => "skipped",
            CheckOutcome::Success => "success",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome plus the result that was propagated, when the check got that far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckReport {
    pub outcome: CheckOutcome,
    pub result: Option<CheckResult>,
    pub check_time: Option<CheckTime>,
}

impl CheckReport {
    fn without_result(outcome: CheckOutcome) -> Self {
        Self {
            outcome,
            result: None,
            check_time: None,
        }
    }
}

/// Runs availability checks for sources: validate, skip recent checks, probe, propagate.
#[derive(Clone)]
pub struct AvailabilityChecker {
    api: Arc<dyn SourcesApi>,
    probe: Arc<dyn ConnectivityProbe>,
    propagation: Propagation,
    identity: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for AvailabilityChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvailabilityChecker")
            .field("propagation", &self.propagation)
            .finish_non_exhaustive()
    }
}

impl AvailabilityChecker {
    pub fn new(
        api: Arc<dyn SourcesApi>,
        probe: Arc<dyn ConnectivityProbe>,
        propagation: Propagation,
    ) -> Self {
        Self {
            api,
            probe,
            propagation,
            identity: Arc::new(AccountIdentityResolver),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_identity_resolver(mut self, identity: Arc<dyn IdentityResolver>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn propagation(&self) -> &Propagation {
        &self.propagation
    }

    /// Runs one check and reports only its terminal state.
    pub async fn availability_check(
        &self,
        request: &CheckRequest,
    ) -> Result<CheckOutcome, AvailabilityError> {
        self.check(request).await.map(|report| report.outcome)
    }

    /// Runs one check. Only a probe that cannot handle the source escapes as an error.
    pub async fn check(&self, request: &CheckRequest) -> Result<CheckReport, AvailabilityError> {
        let Some(source_id) = request.source_id() else {
            metrics().inc_checks_error();
            tracing::error!(
                event = "availability_check.invalid_request",
                missing = "source_id",
                "availability check missing required parameter `source_id`"
            );
            return Ok(CheckReport::without_result(CheckOutcome::Error));
        };

        let span = tracing::info_span!(
            "availability_check",
            source = %source_id,
            mode = %self.propagation.mode()
        );
        self.run(source_id, request.account())
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        source_id: &str,
        account: Option<&str>,
    ) -> Result<CheckReport, AvailabilityError> {
        let mut context = CheckContext::new(source_id)
            .with_identity_headers(identity_headers(self.identity.as_ref(), account));

        let accessor = ResourceAccessor::new(self.api.as_ref());
        let resources = accessor.resolve(source_id).await;
        context.endpoint = resources.endpoint;
        context.application = resources.application;

        if let Some((resource, last_checked_at)) = self.recent_check(&context) {
            metrics().inc_checks_skipped();
            crate::availability_event!(
                info,
                "availability_check.skipped",
                source = source_id,
                resource = resource,
                last_checked_at = last_checked_at.to_rfc3339(),
            );
            return Ok(CheckReport::without_result(CheckOutcome::Skipped));
        }

        if let Some(endpoint) = context.endpoint.as_ref() {
            context.authentication = accessor.authentication(source_id, endpoint).await;
        }

        let result = ConnectivityResolver::new(self.probe.as_ref(), self.clock.as_ref())
            .resolve(&mut context)
            .await
            .map_err(|source| AvailabilityError::Probe {
                source_id: source_id.to_string(),
                source,
            })?;
        let check_time = context.record_check_time(self.clock.as_ref());

        PropagationDispatcher::new(&self.propagation, self.api.as_ref())
            .propagate(&context, &result, check_time)
            .await;

        metrics().inc_checks_success();
        crate::availability_event!(
            info,
            "availability_check.completed",
            source = source_id,
            status = result.status,
            error_message = result.error_message.as_deref().unwrap_or_default(),
        );

        Ok(CheckReport {
            outcome: CheckOutcome::Success,
            result: Some(result),
            check_time: Some(check_time),
        })
    }

    /// The endpoint decides when present; otherwise the application does.
    fn recent_check(&self, context: &CheckContext) -> Option<(ResourceType, DateTime<Utc>)> {
        let (resource, last_checked_at) = match (&context.endpoint, &context.application) {
            (Some(endpoint), _) => (ResourceType::Endpoint, endpoint.last_checked_at),
            (None, Some(application)) => (ResourceType::Application, application.last_checked_at),
            (None, None) => return None,
        };

        let last_checked_at = last_checked_at?;
        checked_recently(Some(last_checked_at), self.clock.now())
            .then_some((resource, last_checked_at))
    }
}
