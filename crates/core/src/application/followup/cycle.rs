// Follow-up cycle primitives shared by the processor, advancer and services

use crate::domain::afc::{self, AFC_FIRST_STEP, DAY_MILLIS};
use crate::domain::{
    FollowUpPlan, InteractionKind, InteractionRecord, Lead, LeadId, LeadUpdate, QuickLogType,
    Task, TaskNature,
};
use crate::error::Result;
use crate::port::{IdProvider, InteractionRepository, LeadRepository, TaskRepository, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info};

/// Repositories and providers the cycle operates on
#[derive(Clone)]
pub struct FollowUpCycle {
    pub(crate) leads: Arc<dyn LeadRepository>,
    pub(crate) tasks: Arc<dyn TaskRepository>,
    pub(crate) interactions: Arc<dyn InteractionRepository>,
    pub(crate) id_provider: Arc<dyn IdProvider>,
    pub(crate) time_provider: Arc<dyn TimeProvider>,
}

impl FollowUpCycle {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        tasks: Arc<dyn TaskRepository>,
        interactions: Arc<dyn InteractionRepository>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            leads,
            tasks,
            interactions,
            id_provider,
            time_provider,
        }
    }

    pub fn now(&self) -> i64 {
        self.time_provider.now_millis()
    }

    /// Build (but do not store) a task for `lead`
    pub fn new_task(
        &self,
        lead: &Lead,
        description: impl Into<String>,
        nature: TaskNature,
        due_at: Option<i64>,
    ) -> Task {
        Task::new(
            self.id_provider.generate_id(),
            self.now(),
            lead.id.clone(),
            lead.name.clone(),
            description,
            nature,
            due_at,
        )
    }

    /// The cycle task for `step`, due `days_for_step(step)` from now
    pub fn step_task(&self, lead: &Lead, step: u8) -> Result<Task> {
        let due_at = self.now() + afc::days_for_step(step)? * DAY_MILLIS;
        let description = afc::follow_up_description(step)?;
        Ok(self.new_task(lead, description, TaskNature::Interactive, Some(due_at)))
    }

    /// Store the cycle task for `step`
    pub async fn schedule_step(&self, lead: &Lead, step: u8) -> Result<Task> {
        let task = self.step_task(lead, step)?;
        self.tasks.insert(&task).await?;
        info!(
            task_id = %task.id,
            lead_id = %lead.id,
            description = %task.description,
            "Task created"
        );
        Ok(task)
    }

    /// Start a plan for `record` against `lead` and its currently open tasks
    pub(crate) async fn plan_for<'a>(
        &'a self,
        record: &InteractionRecord,
        lead: &'a Lead,
    ) -> Result<CyclePlan<'a>> {
        let open = self.tasks.find_open_for_lead(&lead.id).await?;
        let now = self.now();
        let plan = FollowUpPlan::new(record.id.clone(), now).for_lead(lead.id.clone());
        Ok(CyclePlan {
            cycle: self,
            lead,
            now,
            open,
            plan,
        })
    }

    /// Append a system-generated quick log (picked up later by the processor)
    pub async fn log_system_quick(
        &self,
        lead_id: &LeadId,
        log_type: QuickLogType,
        notes: String,
    ) -> Result<InteractionRecord> {
        let record = InteractionRecord::new(
            self.id_provider.generate_id(),
            self.now(),
            lead_id.clone(),
            InteractionKind::QuickLog {
                log_type,
                reasons: Vec::new(),
            },
        )
        .with_notes(notes);
        self.interactions.insert(&record).await?;
        Ok(record)
    }
}

/// Follow-up writes being collected for one interaction.
///
/// Works on a snapshot of the lead's open tasks; a task completed or
/// deleted earlier in the plan is no longer open for later steps.
pub(crate) struct CyclePlan<'a> {
    cycle: &'a FollowUpCycle,
    lead: &'a Lead,
    now: i64,
    open: Vec<Task>,
    plan: FollowUpPlan,
}

impl CyclePlan<'_> {
    pub fn now(&self) -> i64 {
        self.now
    }

    pub fn update(&mut self, change: impl FnOnce(LeadUpdate) -> LeadUpdate) {
        let current = std::mem::take(&mut self.plan.lead_update);
        self.plan.lead_update = change(current);
    }

    pub fn mark_engaged(&mut self) {
        if !self.lead.has_engaged {
            self.update(LeadUpdate::engaged);
        }
    }

    pub fn create_task(
        &mut self,
        description: impl Into<String>,
        nature: TaskNature,
        due_at: Option<i64>,
    ) {
        let task = self.cycle.new_task(self.lead, description, nature, due_at);
        debug!(task_id = %task.id, lead_id = %self.lead.id, description = %task.description, "Task planned");
        self.plan.new_tasks.push(task);
    }

    pub fn schedule_step(&mut self, step: u8) -> Result<()> {
        let task = self.cycle.step_task(self.lead, step)?;
        self.plan.new_tasks.push(task);
        Ok(())
    }

    /// Delete pending follow-ups, restart at step 1 and schedule the day-1 task
    pub fn reset(&mut self) -> Result<()> {
        self.delete_pending_follow_ups();
        self.update(|u| u.afc_step(AFC_FIRST_STEP));
        self.schedule_step(AFC_FIRST_STEP)?;
        debug!(lead_id = %self.lead.id, "Follow-up cycle reset planned");
        Ok(())
    }

    pub fn complete_open_interactive(&mut self) -> usize {
        let (interactive, rest): (Vec<Task>, Vec<Task>) = std::mem::take(&mut self.open)
            .into_iter()
            .partition(|t| t.nature == TaskNature::Interactive);
        self.open = rest;
        let count = interactive.len();
        self.plan
            .complete_tasks
            .extend(interactive.into_iter().map(|t| t.id));
        count
    }

    pub fn delete_pending_follow_ups(&mut self) -> usize {
        self.delete_open(Task::is_pending_follow_up)
    }

    /// Delete the open confirmation and reminder tasks of an event type
    pub fn delete_event_tasks(&mut self, event_type: &str) -> usize {
        let confirm = confirm_description(event_type);
        let remind = remind_description(event_type);
        self.delete_open(|t| t.description == confirm || t.description == remind)
    }

    fn delete_open(&mut self, matches: impl Fn(&Task) -> bool) -> usize {
        let (doomed, rest): (Vec<Task>, Vec<Task>) =
            std::mem::take(&mut self.open).into_iter().partition(|t| matches(t));
        self.open = rest;
        let count = doomed.len();
        self.plan
            .delete_tasks
            .extend(doomed.into_iter().map(|t| t.id));
        count
    }

    pub fn finish(self) -> FollowUpPlan {
        self.plan
    }
}

pub fn confirm_description(event_type: &str) -> String {
    format!("Confirm attendance for {}", event_type)
}

pub fn remind_description(event_type: &str) -> String {
    format!("Remind about {}", event_type)
}
