use crate::domain::ResourceType;
use crate::telemetry::{runtime_counters, RuntimeCounters};
use std::sync::OnceLock;

pub use crate::telemetry::{PropagationOutcomeSnapshot, RuntimeCountersSnapshot};

/// Collector that wraps the runtime counter APIs with a single entrypoint.
pub struct MetricsCollector {
    counters: &'static RuntimeCounters,
}

impl MetricsCollector {
    fn new() -> Self {
        Self {
            counters: runtime_counters(),
        }
    }

    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<MetricsCollector> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    pub fn snapshot(&self) -> RuntimeCountersSnapshot {
        self.counters.snapshot()
    }

    pub fn inc_checks_error(&self) {
        self.counters.inc_checks_error();
    }

    pub fn inc_checks_skipped(&self) {
        self.counters.inc_checks_skipped();
    }

    pub fn inc_checks_success(&self) {
        self.counters.inc_checks_success();
    }

    pub fn inc_publish_success(&self) {
        self.counters.inc_publish_success();
    }

    pub fn inc_publish_failure(&self) {
        self.counters.inc_publish_failure();
    }

    pub fn record_propagation_success(&self, resource: ResourceType, mode: &str) {
        self.counters
            .record_propagation(resource.as_str(), mode, true);
    }

    pub fn record_propagation_failure(&self, resource: ResourceType, mode: &str) {
        self.counters
            .record_propagation(resource.as_str(), mode, false);
    }
}

/// Returns the shared `MetricsCollector` instance.
pub fn metrics() -> &'static MetricsCollector {
    MetricsCollector::global()
}
