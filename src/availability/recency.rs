use chrono::{DateTime, Duration, Utc};

/// A sub-resource checked more recently than this is not checked again.
pub const RECENT_CHECK_THRESHOLD: Duration = Duration::minutes(5);

/// True when `last_checked_at` lies inside the trailing threshold window ending at `now`.
pub fn checked_recently(last_checked_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match last_checked_at {
        Some(checked_at) => now.signed_duration_since(checked_at) < RECENT_CHECK_THRESHOLD,
        None => false,
    }
}
