// Task Domain Model

use super::error::{DomainError, Result};
use super::lead::LeadId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Task ID (UUID v4)
pub type TaskId = String;

/// Interactive tasks need the lead to respond; procedural ones are chores for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskNature {
    Interactive,
    Procedural,
}

impl std::fmt::Display for TaskNature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskNature::Interactive => write!(f, "Interactive"),
            TaskNature::Procedural => write!(f, "Procedural"),
        }
    }
}

impl FromStr for TaskNature {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Interactive" => Ok(TaskNature::Interactive),
            "Procedural" => Ok(TaskNature::Procedural),
            other => Err(DomainError::UnknownVariant {
                kind: "task nature",
                value: other.to_string(),
            }),
        }
    }
}

/// Task Entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub lead_id: LeadId,
    pub lead_name: String,
    pub description: String,
    pub completed: bool,
    pub nature: TaskNature,
    pub due_at: Option<i64>, // epoch ms
    pub created_at: i64,     // epoch ms
}

/// Marker in the description of cycle-generated follow-ups
pub const FOLLOW_UP_MARKER: &str = "Follow-up";

impl Task {
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        lead_id: impl Into<String>,
        lead_name: impl Into<String>,
        description: impl Into<String>,
        nature: TaskNature,
        due_at: Option<i64>,
    ) -> Self {
        Self {
            id: id.into(),
            lead_id: lead_id.into(),
            lead_name: lead_name.into(),
            description: description.into(),
            completed: false,
            nature,
            due_at,
            created_at,
        }
    }

    /// Pending follow-up created by the cycle (deleted on reset or close)
    pub fn is_pending_follow_up(&self) -> bool {
        !self.completed && self.description.contains(FOLLOW_UP_MARKER)
    }

    /// Incomplete interactive task whose due date has passed
    pub fn is_overdue(&self, now_millis: i64) -> bool {
        !self.completed
            && self.nature == TaskNature::Interactive
            && self.due_at.is_some_and(|due| due < now_millis)
    }

    /// Procedural tasks created from an "Info" outcome. Completing one restarts the cycle.
    pub fn is_info_request(&self) -> bool {
        self.nature == TaskNature::Procedural
            && !self.description.contains(FOLLOW_UP_MARKER)
            && !self.description.contains("Confirm")
            && !self.description.contains("Remind")
    }
}
