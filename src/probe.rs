pub mod tcp;

use crate::domain::{Authentication, AvailabilityStatus, CheckResult, Endpoint};
use async_trait::async_trait;
use thiserror::Error;

pub use tcp::TcpConnectProbe;

/// Live connectivity test for one provider type.
///
/// Ordinary connectivity failures are reported as an `Unavailable` result carrying a
/// message. Errors are reserved for configurations the probe cannot handle at all.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn probe(
        &self,
        endpoint: &Endpoint,
        authentication: &Authentication,
    ) -> Result<ProbeOutcome, ProbeError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub status: AvailabilityStatus,
    pub error_message: Option<String>,
}

impl ProbeOutcome {
    pub fn available() -> Self {
        Self {
            status: AvailabilityStatus::Available,
            error_message: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: AvailabilityStatus::Unavailable,
            error_message: Some(message.into()),
        }
    }
}

impl From<ProbeOutcome> for CheckResult {
    fn from(outcome: ProbeOutcome) -> Self {
        CheckResult::new(outcome.status, outcome.error_message)
    }
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection check is not implemented for {provider}")]
    NotImplemented { provider: String },
}

impl ProbeError {
    pub fn not_implemented(provider: impl Into<String>) -> Self {
        ProbeError::NotImplemented {
            provider: provider.into(),
        }
    }
}

/// Stand-in for provider types that never supplied a probe; any call is a contract violation.
#[derive(Clone, Debug)]
pub struct UnimplementedProbe {
    provider: String,
}

impl UnimplementedProbe {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for UnimplementedProbe {
    async fn probe(
        &self,
        _endpoint: &Endpoint,
        _authentication: &Authentication,
    ) -> Result<ProbeOutcome, ProbeError> {
        Err(ProbeError::not_implemented(self.provider.clone()))
    }
}
