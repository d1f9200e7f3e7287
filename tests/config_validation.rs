use source_availability::availability::PropagationMode;
use source_availability::config::{AvailabilityConfig, KafkaConfig};
use std::time::Duration;
use tempfile::{Builder, NamedTempFile};

fn config_file(contents: &str) -> NamedTempFile {
    let file = Builder::new()
        .prefix("availability")
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    std::fs::write(file.path(), contents).expect("write config");
    file
}

#[test]
fn defaults_use_direct_updates_against_local_sources_api() {
    let config = AvailabilityConfig::default();
    config.validate().expect("defaults are valid");

    assert_eq!(config.propagation_mode(), PropagationMode::Direct);
    assert_eq!(
        config.sources_api.base_url,
        "http://localhost:3000/api/sources/v3.1"
    );
    assert_eq!(config.sources_api.connect_timeout().unwrap(), None);
    assert_eq!(config.probe.timeout().unwrap(), Duration::from_secs(10));
    assert_eq!(
        KafkaConfig::default().message_timeout().unwrap(),
        Duration::from_secs(5)
    );
}

#[test]
fn file_settings_select_event_propagation() {
    let file = config_file(
        r#"
update_via_events = true

[sources_api]
base_url = "http://sources-api:8000/api/sources/v3.1"
request_timeout = "15s"

[kafka]
brokers = ["kafka-0:9092", "kafka-1:9092"]
message_timeout = "750ms"
"#,
    );

    let config = AvailabilityConfig::load_from(file.path()).expect("config loads");

    assert_eq!(config.propagation_mode(), PropagationMode::Event);
    assert_eq!(
        config.sources_api.request_timeout().unwrap(),
        Some(Duration::from_secs(15))
    );
    assert_eq!(
        config.sources_api.internal_base_url,
        "http://localhost:3000/internal/v1.0"
    );
    assert_eq!(config.kafka.brokers.len(), 2);
    assert_eq!(config.kafka.client_id, "source-availability");
    assert_eq!(
        config.kafka.message_timeout().unwrap(),
        Duration::from_millis(750)
    );
}

#[test]
fn invalid_duration_is_rejected() {
    let file = config_file(
        r#"
[probe]
timeout = "soon"
"#,
    );

    let err = AvailabilityConfig::load_from(file.path()).expect_err("bad duration");
    assert!(err.to_string().contains("probe.timeout"), "{err}");
}

#[test]
fn event_mode_requires_brokers() {
    let mut config = AvailabilityConfig {
        update_via_events: true,
        ..AvailabilityConfig::default()
    };
    config.kafka.brokers.clear();

    let err = config.validate().expect_err("no brokers");
    assert!(err.to_string().contains("kafka.brokers"), "{err}");

    config.update_via_events = false;
    config.validate().expect("direct mode ignores kafka settings");
}

#[test]
fn empty_base_url_is_rejected() {
    let file = config_file(
        r#"
[sources_api]
base_url = "  "
"#,
    );

    let err = AvailabilityConfig::load_from(file.path()).expect_err("empty base url");
    assert!(err.to_string().contains("sources_api.base_url"), "{err}");
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("absent.toml");
    assert!(AvailabilityConfig::load_from(&missing).is_err());
}
