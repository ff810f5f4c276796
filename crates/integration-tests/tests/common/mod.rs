//! Shared SQLite-backed wiring for the integration tests

#![allow(dead_code)]

use cadence_core::application::focus::{FocusConfig, FocusPorts, FocusSession};
use cadence_core::application::followup::FollowUpCycle;
use cadence_core::domain::{Lead, LeadStatus, Task, TaskNature};
use cadence_core::port::mocks::{
    FixedTimeProvider, RecordingLocationBar, RecordingNotifier, SequentialIdProvider,
};
use cadence_core::port::{InteractionRepository, LeadRepository, TaskRepository};
use cadence_infra_sqlite::{
    create_pool, run_migrations, SqliteFollowUpStore, SqliteInteractionRepository,
    SqliteLeadRepository, SqliteTaskRepository,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// 2024-03-10T12:00:00Z
pub const NOW: i64 = 1_710_072_000_000;

pub struct Env {
    pub pool: SqlitePool,
    pub leads: Arc<SqliteLeadRepository>,
    pub tasks: Arc<SqliteTaskRepository>,
    pub interactions: Arc<SqliteInteractionRepository>,
    pub followups: Arc<SqliteFollowUpStore>,
    pub time: Arc<FixedTimeProvider>,
    pub ids: Arc<SequentialIdProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub location_bar: Arc<RecordingLocationBar>,
}

impl Env {
    pub async fn new() -> Self {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        Self {
            leads: Arc::new(SqliteLeadRepository::new(pool.clone())),
            tasks: Arc::new(SqliteTaskRepository::new(pool.clone())),
            interactions: Arc::new(SqliteInteractionRepository::new(pool.clone())),
            followups: Arc::new(SqliteFollowUpStore::new(pool.clone())),
            pool,
            time: Arc::new(FixedTimeProvider::new(NOW)),
            ids: Arc::new(SequentialIdProvider::new("gen")),
            notifier: Arc::new(RecordingNotifier::new()),
            location_bar: Arc::new(RecordingLocationBar::new()),
        }
    }

    pub fn cycle(&self) -> FollowUpCycle {
        FollowUpCycle::new(
            self.leads.clone(),
            self.tasks.clone(),
            self.interactions.clone(),
            self.ids.clone(),
            self.time.clone(),
        )
    }

    pub fn session(&self) -> FocusSession {
        let ports = FocusPorts {
            tasks: self.tasks.clone(),
            leads: self.leads.clone(),
            interactions: self.interactions.clone(),
            notifier: self.notifier.clone(),
            location_bar: self.location_bar.clone(),
            id_provider: self.ids.clone(),
            time_provider: self.time.clone(),
        };
        FocusSession::new(ports, FocusConfig::default())
    }

    /// Active lead at the given cycle step
    pub async fn lead(&self, id: &str, step: u8) -> Lead {
        let mut lead = Lead::new(id, NOW, format!("Lead {}", id));
        lead.email = Some(format!("{}@example.com", id));
        lead.status = Some(LeadStatus::Active);
        lead.afc_step = step;
        self.leads.insert(&lead).await.unwrap();
        lead
    }

    pub async fn task(&self, id: &str, lead: &Lead, description: &str, nature: TaskNature, due_at: Option<i64>) -> Task {
        let task = Task::new(id, NOW, lead.id.clone(), lead.name.clone(), description, nature, due_at);
        self.tasks.insert(&task).await.unwrap();
        task
    }

    pub async fn stored_lead(&self, id: &str) -> Lead {
        self.leads.find_by_id(&id.to_string()).await.unwrap().unwrap()
    }

    pub async fn open_tasks(&self, lead_id: &str) -> Vec<Task> {
        self.tasks.find_open_for_lead(&lead_id.to_string()).await.unwrap()
    }

    pub async fn pending_interactions(&self) -> usize {
        self.interactions.find_unprocessed(1000).await.unwrap().len()
    }
}
