// Lead Service - intake and cascade delete

use super::cycle::FollowUpCycle;
use crate::domain::afc::AFC_FIRST_STEP;
use crate::domain::{Lead, LeadId, LeadStatus};
use crate::error::{AppError, Result};
use crate::port::CascadeStats;
use tracing::info;

pub struct LeadService {
    cycle: FollowUpCycle,
}

impl LeadService {
    pub fn new(cycle: FollowUpCycle) -> Self {
        Self { cycle }
    }

    /// Store a new lead.
    ///
    /// A lead without a status is a manual entry: it starts the follow-up
    /// cycle at step 1 with a day-1 task. Leads that already carry a status
    /// (imports) are stored as given.
    pub async fn create(&self, mut lead: Lead) -> Result<Lead> {
        if lead.name.trim().is_empty() {
            return Err(AppError::Validation("Lead name is required".to_string()));
        }

        let manual = lead.status.is_none();
        if manual {
            lead.status = Some(LeadStatus::Active);
            lead.afc_step = AFC_FIRST_STEP;
        }

        self.cycle.leads.insert(&lead).await?;
        info!(lead_id = %lead.id, manual, "Lead created");

        if manual {
            self.cycle.schedule_step(&lead, AFC_FIRST_STEP).await?;
        }
        Ok(lead)
    }

    /// Delete a lead together with its tasks and interactions
    pub async fn delete(&self, id: &LeadId) -> Result<CascadeStats> {
        let stats = self.cycle.leads.delete_cascade(id).await?;
        info!(
            lead_id = %id,
            tasks_deleted = stats.tasks_deleted,
            interactions_deleted = stats.interactions_deleted,
            "Lead deleted"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::afc::DAY_MILLIS;
    use crate::domain::{InteractionKind, InteractionRecord, QuickLogType, Task, TaskNature};
    use crate::port::mocks::{FixedTimeProvider, InMemoryStore, SequentialIdProvider};
    use crate::port::{InteractionRepository, LeadRepository};
    use std::sync::Arc;

    const NOW: i64 = 1_710_072_000_000;

    fn service(store: &Arc<InMemoryStore>) -> LeadService {
        LeadService::new(FollowUpCycle::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(SequentialIdProvider::new("task")),
            Arc::new(FixedTimeProvider::new(NOW)),
        ))
    }

    #[tokio::test]
    async fn test_manual_lead_starts_cycle() {
        let store = Arc::new(InMemoryStore::new());
        let lead = service(&store)
            .create(Lead::new("l-1", NOW, "Amal"))
            .await
            .unwrap();

        assert_eq!(lead.status, Some(LeadStatus::Active));
        assert_eq!(lead.afc_step, 1);

        let tasks = store.tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].description, "Day 1 Follow-up");
        assert_eq!(tasks[0].nature, TaskNature::Interactive);
        assert_eq!(tasks[0].due_at, Some(NOW + DAY_MILLIS));
        assert_eq!(tasks[0].lead_name, "Amal");
    }

    #[tokio::test]
    async fn test_imported_lead_is_stored_as_is() {
        let store = Arc::new(InMemoryStore::new());
        let mut lead = Lead::new("l-1", NOW, "Amal");
        lead.status = Some(LeadStatus::Active);

        service(&store).create(lead).await.unwrap();

        assert_eq!(store.lead("l-1").unwrap().afc_step, 0);
        assert!(store.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let err = service(&store)
            .create(Lead::new("l-1", NOW, "  "))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.lead("l-1").is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let store = Arc::new(InMemoryStore::new().with_tasks([
            Task::new("t-1", 0, "l-1", "Amal", "Day 1 Follow-up", TaskNature::Interactive, None),
            Task::new("t-2", 0, "l-2", "Omar", "Day 1 Follow-up", TaskNature::Interactive, None),
        ]));
        LeadRepository::insert(&*store, &Lead::new("l-1", 0, "Amal")).await.unwrap();
        InteractionRepository::insert(
            &*store,
            &InteractionRecord::new(
                "i-1",
                0,
                "l-1",
                InteractionKind::QuickLog {
                    log_type: QuickLogType::Followup,
                    reasons: vec![],
                },
            ),
        )
        .await
        .unwrap();

        let stats = service(&store).delete(&"l-1".to_string()).await.unwrap();

        assert_eq!(stats.tasks_deleted, 1);
        assert_eq!(stats.interactions_deleted, 1);
        assert!(store.lead("l-1").is_none());
        assert_eq!(store.tasks().len(), 1);
        assert!(store.interactions().is_empty());
    }
}
