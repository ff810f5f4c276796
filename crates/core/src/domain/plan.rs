// Follow-up plan - every write caused by one interaction

use super::interaction::InteractionId;
use super::lead::{LeadId, LeadUpdate};
use super::task::{Task, TaskId};

/// Writes decided by the follow-up processor for one interaction.
///
/// A plan is applied as a unit together with marking its interaction
/// processed, so a retry after a failure starts from untouched records.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUpPlan {
    pub interaction_id: InteractionId,
    pub processed_at: i64,
    /// `None` when the lead is gone; only the interaction gets marked
    pub lead_id: Option<LeadId>,
    pub lead_update: LeadUpdate,
    pub complete_tasks: Vec<TaskId>,
    pub delete_tasks: Vec<TaskId>,
    pub new_tasks: Vec<Task>,
}

impl FollowUpPlan {
    pub fn new(interaction_id: impl Into<String>, processed_at: i64) -> Self {
        Self {
            interaction_id: interaction_id.into(),
            processed_at,
            lead_id: None,
            lead_update: LeadUpdate::default(),
            complete_tasks: Vec::new(),
            delete_tasks: Vec::new(),
            new_tasks: Vec::new(),
        }
    }

    pub fn for_lead(mut self, lead_id: impl Into<String>) -> Self {
        self.lead_id = Some(lead_id.into());
        self
    }

    /// Nothing to write apart from the processed marker
    pub fn is_marker_only(&self) -> bool {
        self.lead_update.is_empty()
            && self.complete_tasks.is_empty()
            && self.delete_tasks.is_empty()
            && self.new_tasks.is_empty()
    }
}
