// Follow-up Processor - reacts to every new interaction
//
// Completes stale tasks, moves the lead through the follow-up cycle and
// schedules the next appropriate task.

use super::cycle::{confirm_description, remind_description, CyclePlan, FollowUpCycle};
use crate::domain::afc::{self, AFC_PAUSED, DAY_MILLIS};
use crate::domain::{
    EventStatus, FollowUpPlan, InteractionKind, InteractionRecord, Lead, LeadStatus, Outcome,
    QuickLogType, TaskNature,
};
use crate::error::{AppError, Result};
use crate::port::FollowUpStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Hour (UTC) of the event-day confirmation task
const CONFIRM_HOUR: u32 = 6;

/// Events at least this many days out also get a reminder the day before
const REMINDER_MIN_DAYS: i64 = 3;

const DEFAULT_INFO_NOTE: &str = "Provide requested information.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Applied,
    /// The lead no longer exists; the interaction was only marked processed
    LeadMissing,
}

pub struct FollowUpProcessor {
    cycle: FollowUpCycle,
    store: Arc<dyn FollowUpStore>,
}

impl FollowUpProcessor {
    pub fn new(cycle: FollowUpCycle, store: Arc<dyn FollowUpStore>) -> Self {
        Self { cycle, store }
    }

    /// Work out the follow-up writes for `record` and apply them together
    /// with its processed marker. On error nothing has been written.
    pub async fn process(&self, record: &InteractionRecord) -> Result<ProcessOutcome> {
        let Some(lead) = self.cycle.leads.find_by_id(&record.lead_id).await? else {
            warn!(
                interaction_id = %record.id,
                lead_id = %record.lead_id,
                "Lead not found; skipping interaction"
            );
            self.store
                .apply(&FollowUpPlan::new(record.id.clone(), self.cycle.now()))
                .await?;
            return Ok(ProcessOutcome::LeadMissing);
        };

        let plan = self.plan(record, &lead).await?;
        self.store.apply(&plan).await?;
        debug!(
            interaction_id = %record.id,
            completed = plan.complete_tasks.len(),
            deleted = plan.delete_tasks.len(),
            created = plan.new_tasks.len(),
            "Follow-up plan applied"
        );
        Ok(ProcessOutcome::Applied)
    }

    async fn plan(&self, record: &InteractionRecord, lead: &Lead) -> Result<FollowUpPlan> {
        let mut plan = self.cycle.plan_for(record, lead).await?;
        let now = plan.now();
        plan.update(|u| u.touched_at(now));

        match &record.kind {
            InteractionKind::Feedback { .. } => {
                info!(lead_id = %lead.id, "Processing feedback log");
                plan.mark_engaged();
                plan.reset()?;
            }
            InteractionKind::Outcome(outcome) => {
                info!(lead_id = %lead.id, ?outcome, "Processing outcome log");
                plan.mark_engaged();
                apply_outcome(&mut plan, outcome, record.notes.as_deref())?;
            }
            InteractionKind::QuickLog { log_type, .. } => {
                info!(lead_id = %lead.id, log_type = %log_type, "Processing quick log");
                apply_quick_log(&mut plan, lead, *log_type)?;
            }
        }

        Ok(plan.finish())
    }
}

fn apply_outcome(plan: &mut CyclePlan<'_>, outcome: &Outcome, notes: Option<&str>) -> Result<()> {
    let now = plan.now();
    match outcome {
        Outcome::Info => {
            let note = notes.unwrap_or(DEFAULT_INFO_NOTE);
            plan.create_task(note, TaskNature::Procedural, Some(now + DAY_MILLIS));
            plan.update(|u| u.afc_step(AFC_PAUSED));
        }
        Outcome::Later { follow_up_at } => {
            plan.create_task(
                "Scheduled Follow-up",
                TaskNature::Interactive,
                Some(*follow_up_at),
            );
            plan.update(|u| u.afc_step(AFC_PAUSED));
        }
        Outcome::EventScheduled {
            event_type,
            at,
            rescheduled_from,
        } => {
            let confirm_at = confirm_due_at(*at)?;
            if rescheduled_from.is_some() {
                plan.delete_event_tasks(event_type);
            }
            plan.complete_open_interactive();
            plan.create_task(
                confirm_description(event_type),
                TaskNature::Procedural,
                Some(confirm_at),
            );

            if (*at - now) / DAY_MILLIS >= REMINDER_MIN_DAYS {
                plan.create_task(
                    remind_description(event_type),
                    TaskNature::Procedural,
                    Some(*at - DAY_MILLIS),
                );
            }
        }
        Outcome::EventClosed {
            event_type,
            status: EventStatus::Cancelled,
        } => {
            plan.delete_event_tasks(event_type);
        }
        Outcome::EventClosed {
            status: EventStatus::Completed,
            ..
        } => {}
    }
    Ok(())
}

fn apply_quick_log(plan: &mut CyclePlan<'_>, lead: &Lead, log_type: QuickLogType) -> Result<()> {
    plan.complete_open_interactive();

    if log_type != QuickLogType::Unresponsive {
        plan.mark_engaged();
    }

    match log_type {
        QuickLogType::Enrolled | QuickLogType::Withdrawn => {
            let status = if log_type == QuickLogType::Enrolled {
                LeadStatus::Enrolled
            } else {
                LeadStatus::Withdrawn
            };
            plan.update(|u| u.status(status).afc_step(AFC_PAUSED));
            plan.delete_pending_follow_ups();
            info!(lead_id = %lead.id, status = %status, "Lead closed; cycle ended");
        }
        QuickLogType::Unresponsive => match afc::next_step(lead.afc_step) {
            Some(step) => {
                plan.update(|u| u.afc_step(step));
                plan.schedule_step(step)?;
            }
            None => {
                let status = if lead.has_engaged {
                    LeadStatus::Cooling
                } else {
                    LeadStatus::Dormant
                };
                plan.update(|u| u.status(status).afc_step(AFC_PAUSED));
                info!(lead_id = %lead.id, status = %status, "Follow-up cycle exhausted");
            }
        },
        QuickLogType::Followup | QuickLogType::Unchanged => {
            plan.reset()?;
        }
    }
    Ok(())
}

/// 06:00 UTC on the day of the event
fn confirm_due_at(event_at: i64) -> Result<i64> {
    DateTime::<Utc>::from_timestamp_millis(event_at)
        .and_then(|at| at.date_naive().and_hms_opt(CONFIRM_HOUR, 0, 0))
        .map(|at| at.and_utc().timestamp_millis())
        .ok_or_else(|| AppError::Validation(format!("invalid event time: {}", event_at)))
}
