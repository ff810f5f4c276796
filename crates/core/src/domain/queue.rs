// Queue Domain Model

use super::lead::{Lead, LeadId};
use super::task::Task;
use serde::{Deserialize, Serialize};

/// Which collection a focus queue walks through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    Tasks,
    Leads,
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKind::Tasks => write!(f, "tasks"),
            QueueKind::Leads => write!(f, "leads"),
        }
    }
}

/// One work item in a focus queue (lives only in memory)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Lead owning the item; interactions are logged against it
    pub associated_id: Option<LeadId>,
    pub completed: bool,
    pub kind: QueueKind,
}

impl QueueItem {
    /// Task id of the item when the queue is a task queue
    pub fn task_id(&self) -> Option<&str> {
        match self.kind {
            QueueKind::Tasks => Some(&self.id),
            QueueKind::Leads => None,
        }
    }
}

impl From<Task> for QueueItem {
    fn from(task: Task) -> Self {
        let associated_id = (!task.lead_id.is_empty()).then_some(task.lead_id);
        Self {
            id: task.id,
            name: task.lead_name,
            description: task.description,
            associated_id,
            completed: task.completed,
            kind: QueueKind::Tasks,
        }
    }
}

impl From<Lead> for QueueItem {
    fn from(lead: Lead) -> Self {
        let description = match lead.status {
            Some(status) => format!("{} · {} · step {}", lead.relationship, status, lead.afc_step),
            None => lead.relationship.clone(),
        };
        Self {
            associated_id: Some(lead.id.clone()),
            id: lead.id,
            name: lead.name,
            description,
            completed: false,
            kind: QueueKind::Leads,
        }
    }
}
