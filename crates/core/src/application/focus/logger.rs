// Interaction Logger - submission state machine

use crate::domain::error::{DomainError, Result};
use crate::domain::{InteractionRecord, LogDraft, QueueItem};

/// idle -> submitting -> {submitted -> idle | idle (on error)}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerState {
    Idle,
    Submitting,
    Submitted,
}

impl std::fmt::Display for LoggerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoggerState::Idle => write!(f, "IDLE"),
            LoggerState::Submitting => write!(f, "SUBMITTING"),
            LoggerState::Submitted => write!(f, "SUBMITTED"),
        }
    }
}

/// Owned by the focus session; replaces a page-wide "quick log" provider.
#[derive(Debug)]
pub struct InteractionLogger {
    state: LoggerState,
}

impl Default for InteractionLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionLogger {
    pub fn new() -> Self {
        Self {
            state: LoggerState::Idle,
        }
    }

    pub fn state(&self) -> LoggerState {
        self.state
    }

    /// Idle -> Submitting
    pub fn begin(&mut self) -> Result<()> {
        self.transition(LoggerState::Idle, LoggerState::Submitting)
    }

    /// Submitting -> Submitted
    pub fn succeed(&mut self) -> Result<()> {
        self.transition(LoggerState::Submitting, LoggerState::Submitted)
    }

    /// Submitting -> Idle
    pub fn fail(&mut self) -> Result<()> {
        self.transition(LoggerState::Submitting, LoggerState::Idle)
    }

    /// Submitted -> Idle (after the completion delay)
    pub fn settle(&mut self) -> Result<()> {
        self.transition(LoggerState::Submitted, LoggerState::Idle)
    }

    fn transition(&mut self, from: LoggerState, to: LoggerState) -> Result<()> {
        if self.state != from {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }
        self.state = to;
        Ok(())
    }
}

/// Build the record for a validated draft logged against `item`
pub fn build_record(
    draft: &LogDraft,
    item: &QueueItem,
    id: String,
    now_millis: i64,
) -> Result<InteractionRecord> {
    draft.validate()?;

    let lead_id = item.associated_id.clone().ok_or_else(|| {
        DomainError::ValidationError(format!("item {} has no associated contact", item.id))
    })?;

    let mut record = InteractionRecord::new(id, now_millis, lead_id, draft.kind.clone());
    record.notes = draft
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from);
    if let Some(task_id) = item.task_id() {
        record = record.with_task(task_id);
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QueueKind, QuickLogType};

    fn item(kind: QueueKind, associated: Option<&str>) -> QueueItem {
        QueueItem {
            id: "t-1".into(),
            name: "Amal".into(),
            description: "Day 1 Follow-up".into(),
            associated_id: associated.map(String::from),
            completed: false,
            kind,
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut logger = InteractionLogger::new();
        logger.begin().unwrap();
        logger.succeed().unwrap();
        logger.settle().unwrap();
        assert_eq!(logger.state(), LoggerState::Idle);
    }

    #[test]
    fn test_error_path_returns_to_idle() {
        let mut logger = InteractionLogger::new();
        logger.begin().unwrap();
        logger.fail().unwrap();
        assert_eq!(logger.state(), LoggerState::Idle);
    }

    #[test]
    fn test_double_submit_rejected() {
        let mut logger = InteractionLogger::new();
        logger.begin().unwrap();
        assert!(logger.begin().is_err());
        assert!(logger.settle().is_err());
    }

    #[test]
    fn test_record_for_task_item_carries_task_and_lead() {
        let draft = LogDraft::quick(QuickLogType::Followup).with_notes("  called twice ");
        let record = build_record(&draft, &item(QueueKind::Tasks, Some("l-1")), "i-1".into(), 99)
            .unwrap();

        assert_eq!(record.lead_id, "l-1");
        assert_eq!(record.task_id.as_deref(), Some("t-1"));
        assert_eq!(record.notes.as_deref(), Some("called twice"));
        assert_eq!(record.created_at, 99);
    }

    #[test]
    fn test_record_requires_owner() {
        let draft = LogDraft::quick(QuickLogType::Followup);
        assert!(build_record(&draft, &item(QueueKind::Tasks, None), "i".into(), 0).is_err());
    }
}
