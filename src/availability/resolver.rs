use crate::availability::context::{CheckContext, Clock};
use crate::domain::{Application, CheckResult, APPLICATION_AVAILABLE, APPLICATION_UNAVAILABLE};
use crate::probe::{ConnectivityProbe, ProbeError};

pub const ENDPOINT_OR_APPLICATION_NOT_FOUND: &str =
    "Endpoint or Application not found in Sources API";
pub const AUTHENTICATION_NOT_FOUND: &str = "Authentication not found in Sources API";

/// Turns what the run found about a source into a single availability result.
pub struct ConnectivityResolver<'a> {
    probe: &'a dyn ConnectivityProbe,
    clock: &'a dyn Clock,
}

impl<'a> ConnectivityResolver<'a> {
    pub fn new(probe: &'a dyn ConnectivityProbe, clock: &'a dyn Clock) -> Self {
        Self { probe, clock }
    }

    /// Endpoints are probed live; an application alone reports its own status.
    ///
    /// The check time is recorded before either branch runs.
    pub async fn resolve(&self, context: &mut CheckContext) -> Result<CheckResult, ProbeError> {
        context.record_check_time(self.clock);

        if let Some(endpoint) = context.endpoint.as_ref() {
            let Some(authentication) = context.authentication.as_ref() else {
                return Ok(CheckResult::unavailable(AUTHENTICATION_NOT_FOUND));
            };
            let outcome = self.probe.probe(endpoint, authentication).await?;
            return Ok(outcome.into());
        }

        match context.application.as_ref() {
            Some(application) => Ok(application_result(context.source_id(), application)),
            None => Ok(CheckResult::unavailable(ENDPOINT_OR_APPLICATION_NOT_FOUND)),
        }
    }
}

/// Maps the application's reported status; values other than available/unavailable are
/// treated as unavailable.
pub fn application_result(source_id: &str, application: &Application) -> CheckResult {
    match application.availability_status.as_deref() {
        Some(APPLICATION_AVAILABLE) => CheckResult::available(),
        Some(APPLICATION_UNAVAILABLE) => {
            CheckResult::unavailable(format!("Application id {} unavailable", application.id))
        }
        other => {
            let reported = other.unwrap_or_default();
            crate::availability_event!(
                warn,
                "availability_check.unknown_application_status",
                source = source_id,
                resource = "Application",
                application_id = application.id,
                reported_status = reported,
            );
            CheckResult::unavailable(format!(
                "Application id {} has unknown availability status '{}'",
                application.id, reported
            ))
        }
    }
}
