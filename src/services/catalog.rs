use serde::Serialize;
use time::PrimitiveDateTime;

/// Per-student availability of a test, in priority order: an existing
/// submission wins over everything, then a future schedule, then available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TestAvailability {
    Completed,
    Upcoming,
    Available,
}

pub(crate) fn availability(
    scheduled_at: Option<PrimitiveDateTime>,
    has_submission: bool,
    now: PrimitiveDateTime,
) -> TestAvailability {
    if has_submission {
        return TestAvailability::Completed;
    }

    match scheduled_at {
        Some(scheduled) if scheduled > now => TestAvailability::Upcoming,
        _ => TestAvailability::Available,
    }
}
