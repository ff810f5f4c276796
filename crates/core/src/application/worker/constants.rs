// Worker constants (no magic values)
use std::time::Duration;

/// Sleep duration when no interactions are waiting (500ms)
pub const IDLE_SLEEP_DURATION: Duration = Duration::from_millis(500);

/// Sleep duration after worker error before retry (1s)
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Interactions fetched per poll
pub const DEFAULT_POLL_BATCH: i64 = 50;

/// Overdue sweep interval (twice a day)
pub const DEFAULT_ADVANCE_INTERVAL_HOURS: u64 = 12;

/// Failed processing attempts before an interaction is parked
pub const MAX_PROCESS_ATTEMPTS: u32 = 3;
