// Queue sources backed by the task and lead repositories

use crate::domain::{QueueItem, QueueKind};
use crate::error::Result;
use crate::port::{LeadRepository, QueueSource, TaskRepository, MAX_IDS_PER_LOOKUP};
use async_trait::async_trait;
use std::sync::Arc;

pub struct TaskQueueSource {
    tasks: Arc<dyn TaskRepository>,
}

impl TaskQueueSource {
    pub fn new(tasks: Arc<dyn TaskRepository>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl QueueSource for TaskQueueSource {
    fn batch_limit(&self) -> usize {
        MAX_IDS_PER_LOOKUP
    }

    async fn fetch_batch(&self, ids: &[String]) -> Result<Vec<QueueItem>> {
        let tasks = self.tasks.find_by_ids(ids).await?;
        Ok(tasks.into_iter().map(QueueItem::from).collect())
    }
}

pub struct LeadQueueSource {
    leads: Arc<dyn LeadRepository>,
}

impl LeadQueueSource {
    pub fn new(leads: Arc<dyn LeadRepository>) -> Self {
        Self { leads }
    }
}

#[async_trait]
impl QueueSource for LeadQueueSource {
    fn batch_limit(&self) -> usize {
        MAX_IDS_PER_LOOKUP
    }

    async fn fetch_batch(&self, ids: &[String]) -> Result<Vec<QueueItem>> {
        let leads = self.leads.find_by_ids(ids).await?;
        Ok(leads.into_iter().map(QueueItem::from).collect())
    }
}

/// Pick the source matching a queue kind
pub fn source_for(
    kind: QueueKind,
    tasks: Arc<dyn TaskRepository>,
    leads: Arc<dyn LeadRepository>,
) -> Arc<dyn QueueSource> {
    match kind {
        QueueKind::Tasks => Arc::new(TaskQueueSource::new(tasks)),
        QueueKind::Leads => Arc::new(LeadQueueSource::new(leads)),
    }
}
