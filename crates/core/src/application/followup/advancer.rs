// Follow-up Advancer - periodic sweep over overdue interactive tasks
//
// Each overdue task is closed and an Unresponsive quick log is appended for
// its lead; the processor then moves the lead to the next cycle step.

use super::cycle::FollowUpCycle;
use crate::domain::QuickLogType;
use crate::error::Result;
use tracing::{error, info};

pub struct AfcAdvancer {
    cycle: FollowUpCycle,
}

impl AfcAdvancer {
    pub fn new(cycle: FollowUpCycle) -> Self {
        Self { cycle }
    }

    /// Sweep once. Returns the number of tasks advanced.
    ///
    /// A failure on one task is logged and the sweep continues.
    pub async fn run_once(&self) -> Result<usize> {
        let now = self.cycle.now();
        let overdue = self.cycle.tasks.find_overdue_interactive(now).await?;
        if overdue.is_empty() {
            info!("No overdue follow-up tasks");
            return Ok(0);
        }

        info!(count = overdue.len(), "Advancing overdue follow-up tasks");

        let mut advanced = 0;
        for task in overdue {
            let note = format!(
                "System generated: No response to overdue task '{}'.",
                task.description
            );
            let result = async {
                self.cycle.tasks.set_completed(&task.id, true).await?;
                self.cycle
                    .log_system_quick(&task.lead_id, QuickLogType::Unresponsive, note)
                    .await
            }
            .await;

            match result {
                Ok(record) => {
                    info!(
                        task_id = %task.id,
                        lead_id = %task.lead_id,
                        interaction_id = %record.id,
                        "Overdue task advanced"
                    );
                    advanced += 1;
                }
                Err(e) => {
                    error!(task_id = %task.id, error = %e, "Failed to advance overdue task");
                }
            }
        }

        Ok(advanced)
    }
}
