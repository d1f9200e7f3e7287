use crate::availability::PropagationMode;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AvailabilityConfig {
    #[serde(default)]
    pub sources_api: SourcesApiConfig,
    /// Publish status changes on the event bus instead of patching the Sources API.
    #[serde(default)]
    pub update_via_events: bool,
    #[serde(default)]
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_internal_base_url")]
    pub internal_base_url: String,
    #[serde(default)]
    pub connect_timeout: Option<String>,
    #[serde(default)]
    pub request_timeout: Option<String>,
}

impl Default for SourcesApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            internal_base_url: default_internal_base_url(),
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

impl SourcesApiConfig {
    pub fn connect_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        parse_optional_duration("sources_api.connect_timeout", self.connect_timeout.as_deref())
    }

    pub fn request_timeout(&self) -> Result<Option<Duration>, ConfigError> {
        parse_optional_duration("sources_api.request_timeout", self.request_timeout.as_deref())
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api/sources/v3.1".to_string()
}

fn default_internal_base_url() -> String {
    "http://localhost:3000/internal/v1.0".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub client_id: String,
    pub message_timeout: Option<String>,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            client_id: "source-availability".to_string(),
            message_timeout: Some("5s".to_string()),
        }
    }
}

impl KafkaConfig {
    pub fn message_timeout(&self) -> Result<Duration, ConfigError> {
        Ok(
            parse_optional_duration("kafka.message_timeout", self.message_timeout.as_deref())?
                .unwrap_or(DEFAULT_MESSAGE_TIMEOUT),
        )
    }
}

const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProbeConfig {
    #[serde(default)]
    pub timeout: Option<String>,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        Ok(
            parse_optional_duration("probe.timeout", self.timeout.as_deref())?
                .unwrap_or(DEFAULT_PROBE_TIMEOUT),
        )
    }
}

fn parse_optional_duration(
    key: &str,
    value: Option<&str>,
) -> Result<Option<Duration>, ConfigError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(text) => humantime::parse_duration(text)
            .map(Some)
            .map_err(|err| ConfigError::Message(format!("invalid duration for `{key}`: {err}"))),
    }
}

impl AvailabilityConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name("config/local").required(false))
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> Result<Self, ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Self = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("AVAILABILITY")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("kafka.brokers"),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sources_api.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "`sources_api.base_url` must not be empty".to_string(),
            ));
        }
        self.sources_api.connect_timeout()?;
        self.sources_api.request_timeout()?;
        self.probe.timeout()?;
        if self.update_via_events {
            if self.kafka.brokers.is_empty() {
                return Err(ConfigError::Message(
                    "`kafka.brokers` must list at least one broker when `update_via_events` is set"
                        .to_string(),
                ));
            }
            self.kafka.message_timeout()?;
        }
        Ok(())
    }

    /// The propagation strategy, fixed for the lifetime of the process.
    pub fn propagation_mode(&self) -> PropagationMode {
        if self.update_via_events {
            PropagationMode::Event
        } else {
            PropagationMode::Direct
        }
    }
}
