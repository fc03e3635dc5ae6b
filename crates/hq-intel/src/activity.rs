//! Activity status from live sessions, recent runs and blockers.

use hq_core::ActivityStatus;

pub const EXECUTING_WINDOW_MS: i64 = 5 * 60 * 1000;
pub const WAITING_WINDOW_MS: i64 = 30 * 60 * 1000;

/// Categorical activity of one agent. First matching rule wins:
/// live session seen within 5 min, open blockers, activity within 30 min,
/// any activity at all, nothing.
pub fn derive_activity(
    has_active_session: bool,
    has_blockers: bool,
    last_activity_ms: Option<i64>,
    now_ms: i64,
) -> ActivityStatus {
    let elapsed = last_activity_ms.map(|last| now_ms - last);
    if has_active_session && elapsed.is_some_and(|ms| ms < EXECUTING_WINDOW_MS) {
        return ActivityStatus::Executing;
    }
    if has_blockers {
        return ActivityStatus::Blocked;
    }
    match elapsed {
        Some(ms) if ms < WAITING_WINDOW_MS => ActivityStatus::Waiting,
        Some(_) => ActivityStatus::Idle,
        None => ActivityStatus::Offline,
    }
}
