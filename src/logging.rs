//! Helper macros enforcing consistent availability log fields.
//!
//! These macros keep `source` (and optionally `resource`) fields present on every log
//! emitted from the check pipeline so downstream parsing can rely on them.

/// Log an event for a source/resource pair plus any extra fields.
#[macro_export]
macro_rules! availability_event {
    (
        $level:ident, $event:expr, source = $source:expr, resource = $resource:expr
        $(, $field:ident = $value:expr )* $(,)?
    ) => {
        tracing::$level!(
            event = $event,
            source = %$source,
            resource = %$resource,
            $($field = %$value,)*
        )
    };
    ($level:ident, $event:expr, source = $source:expr $(, $field:ident = $value:expr )* $(,)?) => {
        tracing::$level!(
            event = $event,
            source = %$source,
            $($field = %$value,)*
        )
    };
}
