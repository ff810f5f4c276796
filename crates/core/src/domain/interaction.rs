// Interaction Domain Model
//
// Interactions are append-only: created by the logger (or the follow-up cycle),
// never updated or deleted except by a lead cascade delete.

use super::error::{DomainError, Result};
use super::lead::LeadId;
use super::task::TaskId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Interaction ID (UUID v4)
pub type InteractionId = String;

/// Single-tap categorical log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuickLogType {
    Unresponsive,
    Unchanged,
    Followup,
    Enrolled,
    Withdrawn,
}

impl std::fmt::Display for QuickLogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuickLogType::Unresponsive => write!(f, "Unresponsive"),
            QuickLogType::Unchanged => write!(f, "Unchanged"),
            QuickLogType::Followup => write!(f, "Followup"),
            QuickLogType::Enrolled => write!(f, "Enrolled"),
            QuickLogType::Withdrawn => write!(f, "Withdrawn"),
        }
    }
}

impl FromStr for QuickLogType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "unresponsive" => Ok(QuickLogType::Unresponsive),
            "unchanged" => Ok(QuickLogType::Unchanged),
            "followup" | "follow-up" => Ok(QuickLogType::Followup),
            "enrolled" => Ok(QuickLogType::Enrolled),
            "withdrawn" => Ok(QuickLogType::Withdrawn),
            _ => Err(DomainError::UnknownVariant {
                kind: "quick log type",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    Content,
    Schedule,
    Price,
}

impl FromStr for FeedbackCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "content" => Ok(FeedbackCategory::Content),
            "schedule" => Ok(FeedbackCategory::Schedule),
            "price" => Ok(FeedbackCategory::Price),
            _ => Err(DomainError::UnknownVariant {
                kind: "feedback category",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
}

/// Thumbs up/down for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Perception {
    pub category: FeedbackCategory,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Completed,
    Cancelled,
}

/// Follow-up action captured by an outcome log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Lead asked for information; the note says what
    Info,
    /// Lead asked to be contacted again at a later date
    Later { follow_up_at: i64 },
    EventScheduled {
        event_type: String,
        at: i64,
        /// Previous slot when this is a reschedule
        rescheduled_from: Option<i64>,
    },
    EventClosed {
        event_type: String,
        status: EventStatus,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionKind {
    QuickLog {
        log_type: QuickLogType,
        #[serde(default)]
        reasons: Vec<String>,
    },
    Feedback {
        perceptions: Vec<Perception>,
        #[serde(default)]
        objections: Vec<String>,
    },
    Outcome(Outcome),
}

impl InteractionKind {
    /// Short label used in logs and storage
    pub fn label(&self) -> &'static str {
        match self {
            InteractionKind::QuickLog { .. } => "quick_log",
            InteractionKind::Feedback { .. } => "feedback",
            InteractionKind::Outcome(_) => "outcome",
        }
    }
}

/// Interaction Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: InteractionId,
    pub lead_id: LeadId,
    pub task_id: Option<TaskId>,
    pub kind: InteractionKind,
    pub notes: Option<String>,
    pub created_at: i64, // epoch ms
}

impl InteractionRecord {
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        lead_id: impl Into<String>,
        kind: InteractionKind,
    ) -> Self {
        Self {
            id: id.into(),
            lead_id: lead_id.into(),
            task_id: None,
            kind,
            notes: None,
            created_at,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_task(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }
}

/// Latest accepted event or follow-up time (9999-12-31T23:59:59.999Z)
pub const MAX_TIMESTAMP_MILLIS: i64 = 253_402_300_799_999;

fn check_timestamp(field: &str, at: i64) -> Result<()> {
    if !(0..=MAX_TIMESTAMP_MILLIS).contains(&at) {
        return Err(DomainError::ValidationError(format!(
            "{} is out of range: {}",
            field, at
        )));
    }
    Ok(())
}

/// Fields captured by the logging form before submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDraft {
    pub kind: InteractionKind,
    pub notes: Option<String>,
}

impl LogDraft {
    pub fn quick(log_type: QuickLogType) -> Self {
        Self {
            kind: InteractionKind::QuickLog {
                log_type,
                reasons: Vec::new(),
            },
            notes: None,
        }
    }

    pub fn withdrawal<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: InteractionKind::QuickLog {
                log_type: QuickLogType::Withdrawn,
                reasons: reasons.into_iter().map(Into::into).collect(),
            },
            notes: None,
        }
    }

    pub fn outcome(outcome: Outcome) -> Self {
        Self {
            kind: InteractionKind::Outcome(outcome),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Minimal required fields per logging mode
    pub fn validate(&self) -> Result<()> {
        let blank = |s: &str| s.trim().is_empty();
        let notes_blank = self.notes.as_deref().map_or(true, blank);

        match &self.kind {
            InteractionKind::QuickLog { log_type, reasons } => {
                if *log_type == QuickLogType::Withdrawn && reasons.iter().all(|r| blank(r)) {
                    return Err(DomainError::ValidationError(
                        "withdrawal requires at least one reason".to_string(),
                    ));
                }
            }
            InteractionKind::Feedback { perceptions, .. } => {
                if perceptions.is_empty() {
                    return Err(DomainError::ValidationError(
                        "feedback requires at least one category rating".to_string(),
                    ));
                }
            }
            InteractionKind::Outcome(Outcome::Info) => {
                if notes_blank {
                    return Err(DomainError::ValidationError(
                        "info outcome requires a note".to_string(),
                    ));
                }
            }
            InteractionKind::Outcome(Outcome::Later { follow_up_at }) => {
                check_timestamp("follow-up date", *follow_up_at)?;
            }
            InteractionKind::Outcome(Outcome::EventScheduled {
                event_type,
                at,
                rescheduled_from,
            }) => {
                if blank(event_type) {
                    return Err(DomainError::ValidationError(
                        "event requires a type".to_string(),
                    ));
                }
                check_timestamp("event time", *at)?;
                if let Some(previous) = rescheduled_from {
                    check_timestamp("previous event time", *previous)?;
                }
            }
            InteractionKind::Outcome(Outcome::EventClosed { event_type, .. }) => {
                if blank(event_type) {
                    return Err(DomainError::ValidationError(
                        "event requires a type".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdrawal_requires_reason() {
        assert!(LogDraft::withdrawal(Vec::<String>::new()).validate().is_err());
        assert!(LogDraft::withdrawal(["  "]).validate().is_err());
        assert!(LogDraft::withdrawal(["price"]).validate().is_ok());
    }

    #[test]
    fn test_other_quick_logs_need_nothing() {
        assert!(LogDraft::quick(QuickLogType::Unresponsive).validate().is_ok());
        assert!(LogDraft::quick(QuickLogType::Enrolled).validate().is_ok());
    }

    #[test]
    fn test_feedback_requires_a_rating() {
        let empty = LogDraft {
            kind: InteractionKind::Feedback {
                perceptions: vec![],
                objections: vec!["too far".to_string()],
            },
            notes: None,
        };
        assert!(empty.validate().is_err());

        let rated = LogDraft {
            kind: InteractionKind::Feedback {
                perceptions: vec![Perception {
                    category: FeedbackCategory::Price,
                    sentiment: Sentiment::Negative,
                }],
                objections: vec![],
            },
            notes: None,
        };
        assert!(rated.validate().is_ok());
    }

    #[test]
    fn test_outcome_requirements() {
        assert!(LogDraft::outcome(Outcome::Info).validate().is_err());
        assert!(LogDraft::outcome(Outcome::Info)
            .with_notes("send syllabus")
            .validate()
            .is_ok());

        let no_type = LogDraft::outcome(Outcome::EventScheduled {
            event_type: " ".to_string(),
            at: 1_000,
            rescheduled_from: None,
        });
        assert!(no_type.validate().is_err());
    }

    #[test]
    fn test_times_must_be_in_calendar_range() {
        let event = |at| {
            LogDraft::outcome(Outcome::EventScheduled {
                event_type: "Open House".to_string(),
                at,
                rescheduled_from: None,
            })
        };
        assert!(event(i64::MAX).validate().is_err());
        assert!(event(-1).validate().is_err());
        assert!(event(MAX_TIMESTAMP_MILLIS).validate().is_ok());

        let later = |follow_up_at| LogDraft::outcome(Outcome::Later { follow_up_at });
        assert!(later(i64::MAX).validate().is_err());
        assert!(later(1_710_072_000_000).validate().is_ok());

        let moved = LogDraft::outcome(Outcome::EventScheduled {
            event_type: "Demo".to_string(),
            at: 1_000,
            rescheduled_from: Some(i64::MIN),
        });
        assert!(moved.validate().is_err());
    }

    #[test]
    fn test_kind_json_shape() {
        let kind = InteractionKind::Outcome(Outcome::Later { follow_up_at: 42 });
        let value = serde_json::to_value(&kind).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "outcome", "outcome": "later", "follow_up_at": 42})
        );
        let back: InteractionKind = serde_json::from_value(value).unwrap();
        assert_eq!(back, kind);
    }
}
