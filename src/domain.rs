#![forbid(unsafe_code)]

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Values the Sources API reports in `Application::availability_status`.
pub const APPLICATION_AVAILABLE: &str = "available";
pub const APPLICATION_UNAVAILABLE: &str = "unavailable";

/// Parameters supplied by the trigger for a single availability check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckRequest {
    pub source_id: Option<String>,
    pub account_identifier: Option<String>,
}

const SOURCE_ID_PARAM: &str = "source_id";
/// Accepted spellings of the tenant account, in order of preference.
const ACCOUNT_PARAMS: [&str; 3] = ["account_identifier", "external_tenant", "account_number"];

impl CheckRequest {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: Some(source_id.into()),
            account_identifier: None,
        }
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account_identifier = Some(account.into());
        self
    }

    /// Builds a request from the JSON params map a trigger delivers.
    ///
    /// Each field is read on its own; strings and numbers are accepted, and a param of
    /// any other shape is ignored with a warning instead of discarding the request.
    pub fn from_params(params: &serde_json::Value) -> Self {
        Self {
            source_id: scalar_param(params, SOURCE_ID_PARAM),
            account_identifier: ACCOUNT_PARAMS
                .iter()
                .find_map(|name| scalar_param(params, name)),
        }
    }

    /// Blank identifiers are treated the same as absent ones.
    pub fn source_id(&self) -> Option<&str> {
        self.source_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn account(&self) -> Option<&str> {
        self.account_identifier
            .as_deref()
            .map(str::trim)
            .filter(|account| !account.is_empty())
    }
}

fn scalar_param(params: &serde_json::Value, name: &str) -> Option<String> {
    match params.get(name)? {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        serde_json::Value::Null => None,
        other => {
            tracing::warn!(
                event = "availability_check.param_ignored",
                param = name,
                value = %other,
                "ignoring trigger parameter that is neither a string nor a number"
            );
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
}

impl AvailabilityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::Unavailable => "unavailable",
        }
    }

    pub fn is_available(self) -> bool {
        matches!(self, AvailabilityStatus::Available)
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckResult {
    pub status: AvailabilityStatus,
    pub error_message: Option<String>,
}

impl CheckResult {
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

    pub fn new(status: AvailabilityStatus, error_message: Option<String>) -> Self {
        Self {
            status,
            error_message,
        }
    }
}

/// The single timestamp written to every resource updated during one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CheckTime(DateTime<Utc>);

impl CheckTime {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    pub fn instant(self) -> DateTime<Utc> {
        self.0
    }

    pub fn to_rfc3339(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    pub id: String,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub scheme: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub verify_ssl: Option<bool>,
    #[serde(default)]
    pub availability_status: Option<String>,
    #[serde(default)]
    pub availability_status_error: Option<String>,
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_available_at: Option<DateTime<Utc>>,
}

impl Endpoint {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Port to probe, falling back to the scheme's well-known port.
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| match self.scheme.as_deref() {
            Some("https") => Some(443),
            Some("http") => Some(80),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Application {
    pub id: String,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub availability_status: Option<String>,
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_available_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Authentication {
    pub id: String,
    #[serde(default)]
    pub authtype: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Authentication {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("id", &self.id)
            .field("authtype", &self.authtype)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Source,
    Endpoint,
    Application,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Source => "Source",
            ResourceType::Endpoint => "Endpoint",
            ResourceType::Application => "Application",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
