use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;
use source_availability::availability::{checked_recently, RECENT_CHECK_THRESHOLD};
use source_availability::availability::resolver::application_result;
use source_availability::domain::{Application, AvailabilityStatus};

fn base_instant() -> DateTime<Utc> {
    DateTime::from_timestamp(1_717_406_100, 0).expect("valid timestamp")
}

proptest! {
    #[test]
    fn checks_inside_threshold_are_recent(
        age_ms in 0i64..RECENT_CHECK_THRESHOLD.num_milliseconds()
    ) {
        let now = base_instant();
        let checked = now - Duration::milliseconds(age_ms);
        prop_assert!(checked_recently(Some(checked), now));
    }

    #[test]
    fn checks_at_or_past_threshold_are_stale(extra_ms in 0i64..86_400_000) {
        let now = base_instant();
        let checked = now - RECENT_CHECK_THRESHOLD - Duration::milliseconds(extra_ms);
        prop_assert!(!checked_recently(Some(checked), now));
    }

    #[test]
    fn never_checked_is_never_recent(offset_s in -86_400i64..86_400) {
        let now = base_instant() + Duration::seconds(offset_s);
        prop_assert!(!checked_recently(None, now));
    }

    #[test]
    fn unrecognised_application_status_is_unavailable(status in "[a-z_]{1,16}") {
        prop_assume!(status != "available" && status != "unavailable");
        let mut application = Application::new("7");
        application.availability_status = Some(status.clone());

        let result = application_result("42", &application);
        prop_assert_eq!(result.status, AvailabilityStatus::Unavailable);
        let message = result.error_message.unwrap_or_default();
        prop_assert!(message.contains(&status), "message: {}", message);
    }
}
