// Task Repository Port (Interface)

use crate::domain::{LeadId, Task, TaskId};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for Task persistence
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task
    async fn insert(&self, task: &Task) -> Result<()>;

    /// Find task by ID
    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>>;

    /// Multi-id lookup (at most MAX_IDS_PER_LOOKUP ids, results unordered)
    async fn find_by_ids(&self, ids: &[TaskId]) -> Result<Vec<Task>>;

    /// Incomplete tasks of a lead
    async fn find_open_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Task>>;

    /// Incomplete interactive tasks due before `now_millis`
    async fn find_overdue_interactive(&self, now_millis: i64) -> Result<Vec<Task>>;

    /// Incomplete tasks ordered by due date
    async fn list_open(&self, limit: i64) -> Result<Vec<Task>>;

    /// Partial update of the completed flag; returns the previous value
    async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<bool>;

    /// Delete a task
    async fn delete(&self, id: &TaskId) -> Result<()>;
}
