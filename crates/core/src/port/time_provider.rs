// Clock port: follow-up due dates, sweep cutoffs and record timestamps

/// Epoch milliseconds, UTC. Fixed in tests so due dates are exact.
pub trait TimeProvider: Send + Sync {
    fn now_millis(&self) -> i64;
}

pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::afc::DAY_MILLIS;
    use crate::domain::interaction::MAX_TIMESTAMP_MILLIS;

    #[test]
    fn test_system_clock_leaves_room_for_scheduling() {
        let now = SystemTimeProvider.now_millis();
        // After 2024-01-01 and far enough from the upper bound to book a year out
        assert!(now > 1_704_067_200_000);
        assert!(now + 365 * DAY_MILLIS < MAX_TIMESTAMP_MILLIS);
    }
}
