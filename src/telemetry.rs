use crate::error::Result;
use chrono::{SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fmt::{self as stdfmt};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::sync::OnceLock;
use tracing::field::{Field, Visit};
use tracing::Event;
use tracing::Subscriber;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::{
    self as fmt_subscriber, format::Writer, FmtContext, FormatEvent, FormatFields,
};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

const SERVICE_NAME: &str = "source-availability";

pub fn init_tracing() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("source_availability=info,info"));

    let stdout = std::io::stdout;
    let stderr = std::io::stderr;

    let writer = stdout
        .with_max_level(tracing::Level::INFO)
        .or_else(stderr.with_min_level(tracing::Level::WARN));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(false)
        .with_ansi(false)
        .event_format(KeyValueFormatter::new())
        .fmt_fields(fmt_subscriber::format::DefaultFields::new())
        .with_writer(writer)
        .try_init()
        .map_err(|err| crate::err!("failed to initialise tracing subscriber: {err}"))
}

/// Renders each event as one `key=value` line.
pub struct KeyValueFormatter {
    service_name: &'static str,
}

impl KeyValueFormatter {
    pub const fn new() -> Self {
        Self {
            service_name: SERVICE_NAME,
        }
    }
}

impl Default for KeyValueFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, N> FormatEvent<S, N> for KeyValueFormatter
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let pid = std::process::id().to_string();
        let metadata = event.metadata();

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let message = visitor
            .message
            .take()
            .unwrap_or_else(|| metadata.name().to_string());

        let mut fields = visitor.fields;
        fields.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));

        let mut line = String::new();
        push_field(&mut line, "ts", &timestamp);
        push_field(&mut line, "level", metadata.level().as_str());
        push_field(&mut line, "service", self.service_name);
        push_field(&mut line, "component", metadata.target());
        push_field(&mut line, "pid", &pid);

        if let Some(span_path) = current_span_path(ctx) {
            push_field(&mut line, "span", &span_path);
        }

        push_field(&mut line, "msg", &message);

        for (key, value) in fields {
            push_field(&mut line, &key, &value);
        }

        if let Some(file) = metadata.file() {
            push_field(&mut line, "file", file);
        }
        if let Some(line_no) = metadata.line() {
            push_field(&mut line, "line", &line_no.to_string());
        }

        writer.write_str(&line)?;
        writer.write_char('\n')
    }
}

fn current_span_path<S, N>(ctx: &FmtContext<'_, S, N>) -> Option<String>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    let span = ctx.lookup_current()?;
    let names: Vec<&str> = span.scope().from_root().map(|s| s.name()).collect();
    if names.is_empty() {
        None
    } else {
        Some(names.join("."))
    }
}

fn push_field(line: &mut String, key: &str, value: &str) {
    if !line.is_empty() {
        line.push(' ');
    }
    line.push_str(key);
    line.push('=');
    if value.is_empty() || value.contains(char::is_whitespace) || value.contains('"') {
        line.push('"');
        line.push_str(&value.replace('\\', "\\\\").replace('"', "\\\""));
        line.push('"');
    } else {
        line.push_str(value);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldVisitor {
    fn record_field(&mut self, field: &Field, value: String) {
        if field.name().is_empty() {
            return;
        }
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_field(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn stdfmt::Debug) {
        self.record_field(field, format!("{value:?}"));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_field(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_field(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_field(field, value.to_string());
    }
}

#[derive(Default)]
pub struct RuntimeCounters {
    checks_error: AtomicU64,
    checks_skipped: AtomicU64,
    checks_success: AtomicU64,
    publish_success: AtomicU64,
    publish_failure: AtomicU64,
    propagation: PropagationRegistry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeCountersSnapshot {
    pub checks_error: u64,
    pub checks_skipped: u64,
    pub checks_success: u64,
    pub publish_success: u64,
    pub publish_failure: u64,
    pub propagation: Vec<PropagationOutcomeSnapshot>,
}

impl RuntimeCountersSnapshot {
    pub fn propagation_for(
        &self,
        resource_type: &str,
        mode: &str,
    ) -> Option<&PropagationOutcomeSnapshot> {
        self.propagation
            .iter()
            .find(|entry| entry.resource_type == resource_type && entry.mode == mode)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropagationOutcomeSnapshot {
    pub resource_type: String,
    pub mode: String,
    pub success: u64,
    pub failure: u64,
}

#[derive(Default, Clone, Copy)]
struct OutcomeCounts {
    success: u64,
    failure: u64,
}

#[derive(Default)]
struct PropagationRegistry {
    outcomes: Mutex<BTreeMap<(String, String), OutcomeCounts>>,
}

impl PropagationRegistry {
    fn record(&self, resource_type: &str, mode: &str, success: bool) {
        let mut guard = self
            .outcomes
            .lock()
            .expect("propagation outcomes lock poisoned");
        let entry = guard
            .entry((resource_type.to_string(), mode.to_string()))
            .or_default();
        if success {
            entry.success += 1;
        } else {
            entry.failure += 1;
        }
    }

    fn snapshot(&self) -> Vec<PropagationOutcomeSnapshot> {
        let guard = self
            .outcomes
            .lock()
            .expect("propagation outcomes lock poisoned");
        guard
            .iter()
            .map(|((resource_type, mode), counts)| PropagationOutcomeSnapshot {
                resource_type: resource_type.clone(),
                mode: mode.clone(),
                success: counts.success,
                failure: counts.failure,
            })
            .collect()
    }
}

static RUNTIME_COUNTERS: OnceLock<RuntimeCounters> = OnceLock::new();

pub fn runtime_counters() -> &'static RuntimeCounters {
    RUNTIME_COUNTERS.get_or_init(RuntimeCounters::default)
}

impl RuntimeCounters {
    pub fn inc_checks_error(&self) {
        self.checks_error.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_checks_skipped(&self) {
        self.checks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_checks_success(&self) {
        self.checks_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_publish_success(&self) {
        self.publish_success.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_publish_failure(&self) {
        self.publish_failure.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_propagation(&self, resource_type: &str, mode: &str, success: bool) {
        self.propagation.record(resource_type, mode, success);
    }

    pub fn snapshot(&self) -> RuntimeCountersSnapshot {
        RuntimeCountersSnapshot {
            checks_error: self.checks_error.load(Ordering::Relaxed),
            checks_skipped: self.checks_skipped.load(Ordering::Relaxed),
            checks_success: self.checks_success.load(Ordering::Relaxed),
            publish_success: self.publish_success.load(Ordering::Relaxed),
            publish_failure: self.publish_failure.load(Ordering::Relaxed),
            propagation: self.propagation.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_field_quotes_values_with_spaces() {
        let mut line = String::new();
        push_field(&mut line, "msg", "source checked");
        push_field(&mut line, "status", "available");
        assert_eq!(line, "msg=\"source checked\" status=available");
    }

    #[test]
    fn propagation_registry_accumulates_per_resource_and_mode() {
        let counters = RuntimeCounters::default();
        counters.record_propagation("Endpoint", "direct", true);
        counters.record_propagation("Endpoint", "direct", false);
        counters.record_propagation("Endpoint", "event", true);

        let snapshot = counters.snapshot();
        let direct = snapshot
            .propagation_for("Endpoint", "direct")
            .expect("direct entry");
        assert_eq!((direct.success, direct.failure), (1, 1));
        let event = snapshot
            .propagation_for("Endpoint", "event")
            .expect("event entry");
        assert_eq!((event.success, event.failure), (1, 0));
    }
}
