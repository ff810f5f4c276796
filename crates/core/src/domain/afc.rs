// Automated Follow-up Cycle (AFC) schedule

use super::error::{DomainError, Result};

/// Day offsets per step: 1st follow-up on day 1, then day 3, 5, 7 and the final one on day 15
pub const AFC_SCHEDULE: [(u8, i64); 5] = [(1, 1), (2, 3), (3, 5), (4, 7), (5, 15)];

/// Step value meaning "cycle paused or ended"
pub const AFC_PAUSED: u8 = 0;

pub const AFC_FIRST_STEP: u8 = 1;

pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Days until the follow-up of `step`
pub fn days_for_step(step: u8) -> Result<i64> {
    AFC_SCHEDULE
        .iter()
        .find(|(s, _)| *s == step)
        .map(|(_, days)| *days)
        .ok_or(DomainError::InvalidAfcStep(step))
}

/// Next step after `current`, or `None` once the final step is spent
pub fn next_step(current: u8) -> Option<u8> {
    let next = current.checked_add(1)?;
    days_for_step(next).ok().map(|_| next)
}

/// Description of the cycle task for `step`
pub fn follow_up_description(step: u8) -> Result<String> {
    Ok(format!("Day {} Follow-up", days_for_step(step)?))
}
