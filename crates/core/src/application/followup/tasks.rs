// Task Service - manual task completion

use super::cycle::FollowUpCycle;
use crate::domain::{QuickLogType, TaskId};
use crate::error::{AppError, Result};
use tracing::info;

const INFO_SENT_NOTE: &str = "Requested information sent.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompleteOutcome {
    /// The task was already completed; nothing changed
    pub already_completed: bool,
    /// A Followup log was appended (info request fulfilled)
    pub follow_up_logged: bool,
}

pub struct TaskService {
    cycle: FollowUpCycle,
}

impl TaskService {
    pub fn new(cycle: FollowUpCycle) -> Self {
        Self { cycle }
    }

    /// Mark a task completed.
    ///
    /// Fulfilling an information request counts as contact with the lead and
    /// restarts its follow-up cycle through a Followup log.
    pub async fn complete(&self, id: &TaskId) -> Result<CompleteOutcome> {
        let task = self
            .cycle
            .tasks
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Task {} not found", id)))?;

        let was_completed = self.cycle.tasks.set_completed(id, true).await?;
        if was_completed {
            return Ok(CompleteOutcome {
                already_completed: true,
                follow_up_logged: false,
            });
        }
        info!(task_id = %id, lead_id = %task.lead_id, "Task completed");

        let follow_up_logged = task.is_info_request();
        if follow_up_logged {
            let record = self
                .cycle
                .log_system_quick(
                    &task.lead_id,
                    QuickLogType::Followup,
                    INFO_SENT_NOTE.to_string(),
                )
                .await?;
            info!(
                task_id = %id,
                interaction_id = %record.id,
                "Info request fulfilled; follow-up logged"
            );
        }

        Ok(CompleteOutcome {
            already_completed: false,
            follow_up_logged,
        })
    }
}
