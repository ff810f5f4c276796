// ============================================================================
// Mock Implementations for Testing
// ============================================================================

use super::lead_repository::{CascadeStats, LeadRepository, MAX_IDS_PER_LOOKUP};
use super::{
    FocusLocation, FollowUpStore, IdProvider, InteractionRepository, LocationBar, Notice,
    NoticeLevel, Notifier, TaskRepository, TimeProvider,
};
use crate::domain::{
    FollowUpPlan, InteractionId, InteractionRecord, Lead, LeadId, LeadUpdate, Task, TaskId,
    TaskNature,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct StoreState {
    leads: Vec<Lead>,
    tasks: Vec<Task>,
    interactions: Vec<InteractionRecord>,
    processed: HashSet<InteractionId>,
    attempts: HashMap<InteractionId, u32>,
    parked: HashSet<InteractionId>,
}

/// In-memory record store implementing every repository port.
///
/// Multi-id lookups return rows in reverse insertion order so callers
/// cannot rely on the store preserving request order.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    batch_calls: AtomicU64,
    single_lookups: Mutex<HashMap<String, usize>>,
    interaction_inserts: AtomicU64,
    fail_batches: Mutex<bool>,
    fail_interaction_inserts: Mutex<bool>,
    fail_plans: Mutex<bool>,
    lookup_delay: Mutex<Option<Duration>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leads(self, leads: impl IntoIterator<Item = Lead>) -> Self {
        self.state.lock().unwrap().leads.extend(leads);
        self
    }

    pub fn with_tasks(self, tasks: impl IntoIterator<Item = Task>) -> Self {
        self.state.lock().unwrap().tasks.extend(tasks);
        self
    }

    pub fn fail_batches(&self, fail: bool) {
        *self.fail_batches.lock().unwrap() = fail;
    }

    pub fn fail_interaction_inserts(&self, fail: bool) {
        *self.fail_interaction_inserts.lock().unwrap() = fail;
    }

    /// Reject every follow-up plan before any of it is applied
    pub fn fail_plans(&self, fail: bool) {
        *self.fail_plans.lock().unwrap() = fail;
    }

    /// Delay every single-record lookup (lets concurrent callers overlap)
    pub fn set_lookup_delay(&self, delay: Duration) {
        *self.lookup_delay.lock().unwrap() = Some(delay);
    }

    pub fn batch_calls(&self) -> u64 {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn single_lookups(&self, id: &str) -> usize {
        self.single_lookups
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    /// Insert attempts, including failed ones
    pub fn interaction_inserts(&self) -> u64 {
        self.interaction_inserts.load(Ordering::SeqCst)
    }

    pub fn interactions(&self) -> Vec<InteractionRecord> {
        self.state.lock().unwrap().interactions.clone()
    }

    pub fn is_processed(&self, id: &str) -> bool {
        self.state.lock().unwrap().processed.contains(id)
    }

    pub fn is_parked(&self, id: &str) -> bool {
        self.state.lock().unwrap().parked.contains(id)
    }

    pub fn attempts(&self, id: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .attempts
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().tasks.clone()
    }

    pub fn lead(&self, id: &str) -> Option<Lead> {
        self.state
            .lock()
            .unwrap()
            .leads
            .iter()
            .find(|l| l.id == id)
            .cloned()
    }

    fn check_batch(&self, ids: &[String]) -> Result<()> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_batches.lock().unwrap() {
            return Err(AppError::Database("injected batch failure".to_string()));
        }
        if ids.len() > MAX_IDS_PER_LOOKUP {
            return Err(AppError::Validation(format!(
                "lookup of {} ids exceeds limit of {}",
                ids.len(),
                MAX_IDS_PER_LOOKUP
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LeadRepository for InMemoryStore {
    async fn insert(&self, lead: &Lead) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.leads.iter().any(|l| l.id == lead.id) {
            return Err(AppError::Conflict(format!("Lead {} exists", lead.id)));
        }
        state.leads.push(lead.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>> {
        *self
            .single_lookups
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_default() += 1;

        let delay = *self.lookup_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.lead(id))
    }

    async fn find_by_ids(&self, ids: &[LeadId]) -> Result<Vec<Lead>> {
        self.check_batch(ids)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .leads
            .iter()
            .rev()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .leads
            .iter()
            .find(|l| l.email.as_deref() == Some(email))
            .cloned())
    }

    async fn list(&self, limit: i64) -> Result<Vec<Lead>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .leads
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn replace(&self, lead: &Lead) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let slot = state
            .leads
            .iter_mut()
            .find(|l| l.id == lead.id)
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", lead.id)))?;
        *slot = lead.clone();
        Ok(())
    }

    async fn update_fields(&self, id: &LeadId, update: &LeadUpdate) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let lead = state
            .leads
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", id)))?;
        update.apply_to(lead);
        Ok(())
    }

    async fn delete_cascade(&self, id: &LeadId) -> Result<CascadeStats> {
        let mut state = self.state.lock().unwrap();
        let before = state.leads.len();
        state.leads.retain(|l| &l.id != id);
        if state.leads.len() == before {
            return Err(AppError::NotFound(format!("Lead {} not found", id)));
        }

        let tasks_before = state.tasks.len();
        state.tasks.retain(|t| &t.lead_id != id);
        let interactions_before = state.interactions.len();
        state.interactions.retain(|i| &i.lead_id != id);

        Ok(CascadeStats {
            tasks_deleted: (tasks_before - state.tasks.len()) as u64,
            interactions_deleted: (interactions_before - state.interactions.len()) as u64,
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn insert(&self, task: &Task) -> Result<()> {
        self.state.lock().unwrap().tasks.push(task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        let state = self.state.lock().unwrap();
        Ok(state.tasks.iter().find(|t| &t.id == id).cloned())
    }

    async fn find_by_ids(&self, ids: &[TaskId]) -> Result<Vec<Task>> {
        self.check_batch(ids)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .tasks
            .iter()
            .rev()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn find_open_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Task>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tasks
            .iter()
            .filter(|t| &t.lead_id == lead_id && !t.completed)
            .cloned()
            .collect())
    }

    async fn find_overdue_interactive(&self, now_millis: i64) -> Result<Vec<Task>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.nature == TaskNature::Interactive && t.is_overdue(now_millis))
            .cloned()
            .collect())
    }

    async fn list_open(&self, limit: i64) -> Result<Vec<Task>> {
        let state = self.state.lock().unwrap();
        let mut open: Vec<Task> = state.tasks.iter().filter(|t| !t.completed).cloned().collect();
        open.sort_by_key(|t| (t.due_at.unwrap_or(i64::MAX), t.created_at));
        open.truncate(limit.max(0) as usize);
        Ok(open)
    }

    async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let task = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Task {} not found", id)))?;
        Ok(std::mem::replace(&mut task.completed, completed))
    }

    async fn delete(&self, id: &TaskId) -> Result<()> {
        self.state.lock().unwrap().tasks.retain(|t| &t.id != id);
        Ok(())
    }
}

#[async_trait]
impl InteractionRepository for InMemoryStore {
    async fn insert(&self, record: &InteractionRecord) -> Result<()> {
        self.interaction_inserts.fetch_add(1, Ordering::SeqCst);
        if *self.fail_interaction_inserts.lock().unwrap() {
            return Err(AppError::Database("injected write failure".to_string()));
        }
        self.state.lock().unwrap().interactions.push(record.clone());
        Ok(())
    }

    async fn find_for_lead(&self, lead_id: &LeadId) -> Result<Vec<InteractionRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .interactions
            .iter()
            .filter(|i| &i.lead_id == lead_id)
            .cloned()
            .collect())
    }

    async fn find_unprocessed(&self, limit: i64) -> Result<Vec<InteractionRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .interactions
            .iter()
            .filter(|i| !state.processed.contains(&i.id) && !state.parked.contains(&i.id))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn record_failure(&self, id: &InteractionId, _error: &str) -> Result<u32> {
        let mut state = self.state.lock().unwrap();
        let attempts = state.attempts.entry(id.clone()).or_default();
        *attempts += 1;
        Ok(*attempts)
    }

    async fn mark_failed(&self, id: &InteractionId, _at_millis: i64) -> Result<()> {
        self.state.lock().unwrap().parked.insert(id.clone());
        Ok(())
    }
}

#[async_trait]
impl FollowUpStore for InMemoryStore {
    async fn apply(&self, plan: &FollowUpPlan) -> Result<()> {
        if *self.fail_plans.lock().unwrap() {
            return Err(AppError::Database("injected plan failure".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        if state.processed.contains(&plan.interaction_id) {
            return Err(AppError::Conflict(format!(
                "Interaction {} already processed",
                plan.interaction_id
            )));
        }

        if let Some(lead_id) = &plan.lead_id {
            let lead = state
                .leads
                .iter_mut()
                .find(|l| &l.id == lead_id)
                .ok_or_else(|| AppError::NotFound(format!("Lead {} not found", lead_id)))?;
            plan.lead_update.apply_to(lead);

            for task in state.tasks.iter_mut() {
                if plan.complete_tasks.contains(&task.id) {
                    task.completed = true;
                }
            }
            state.tasks.retain(|t| !plan.delete_tasks.contains(&t.id));
            state.tasks.extend(plan.new_tasks.iter().cloned());
        }

        state.processed.insert(plan.interaction_id.clone());
        Ok(())
    }
}

/// Notifier that keeps every notice
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.level == level)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Location bar that keeps the history of replaced locations
#[derive(Default)]
pub struct RecordingLocationBar {
    history: Mutex<Vec<FocusLocation>>,
}

impl RecordingLocationBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<FocusLocation> {
        self.history.lock().unwrap().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocationBar for RecordingLocationBar {
    fn replace(&self, location: &FocusLocation) {
        self.history.lock().unwrap().push(location.clone());
    }
}

/// Manually driven clock
pub struct FixedTimeProvider {
    now: AtomicI64,
}

impl FixedTimeProvider {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Deterministic ids: `{prefix}-1`, `{prefix}-2`, ...
pub struct SequentialIdProvider {
    prefix: String,
    counter: AtomicU64,
}

impl SequentialIdProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(1),
        }
    }
}

impl IdProvider for SequentialIdProvider {
    fn generate_id(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}
