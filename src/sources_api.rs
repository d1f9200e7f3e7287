pub mod http;

use crate::domain::{Application, Authentication, AvailabilityStatus, CheckTime, Endpoint};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use http::HttpSourcesApi;

/// Read and update access to the Sources API records an availability check touches.
///
/// Lookups return `Ok(None)` when the record does not exist; only transport or server
/// failures are errors.
#[async_trait]
pub trait SourcesApi: Send + Sync {
    async fn get_endpoint(&self, source_id: &str) -> Result<Option<Endpoint>, ApiError>;

    async fn get_application(&self, source_id: &str) -> Result<Option<Application>, ApiError>;

    async fn get_authentication(
        &self,
        endpoint_id: &str,
    ) -> Result<Option<Authentication>, ApiError>;

    async fn update_source(&self, id: &str, patch: &AvailabilityPatch) -> Result<(), ApiError>;

    async fn update_endpoint(&self, id: &str, patch: &AvailabilityPatch) -> Result<(), ApiError>;

    async fn update_application(&self, id: &str, patch: &AvailabilityPatch)
        -> Result<(), ApiError>;
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to `{url}` failed: {message}")]
    Transport { url: String, message: String },
    #[error("`{url}` responded with status {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },
    #[error("failed to decode response from `{url}`: {message}")]
    Decode { url: String, message: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn status(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    pub fn decode(url: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Decode {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Partial update body sent to `PATCH /sources|endpoints|applications/{id}`.
///
/// Absent fields are left untouched by the API.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_status: Option<AvailabilityStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_status_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_available_at: Option<String>,
}

impl AvailabilityPatch {
    fn timestamps(status: AvailabilityStatus, checked_at: CheckTime) -> Self {
        let stamp = checked_at.to_rfc3339();
        Self {
            last_available_at: status.is_available().then(|| stamp.clone()),
            last_checked_at: Some(stamp),
            ..Self::default()
        }
    }

    pub fn for_source(status: AvailabilityStatus, checked_at: CheckTime) -> Self {
        Self {
            availability_status: Some(status),
            ..Self::timestamps(status, checked_at)
        }
    }

    pub fn for_endpoint(
        status: AvailabilityStatus,
        error_message: Option<&str>,
        checked_at: CheckTime,
    ) -> Self {
        Self {
            availability_status: Some(status),
            availability_status_error: Some(error_message.unwrap_or_default().to_string()),
            ..Self::timestamps(status, checked_at)
        }
    }

    /// Applications carry their own status; only the check timestamps are written.
    pub fn for_application(status: AvailabilityStatus, checked_at: CheckTime) -> Self {
        Self::timestamps(status, checked_at)
    }
}
