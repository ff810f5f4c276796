// SQLite FollowUpStore Implementation
//
// One transaction per plan: lead update, task changes and the processed
// marker commit together or not at all.

use crate::error::map_sqlx_error;
use crate::lead_repository::update_lead_fields;
use crate::task_repository::insert_task;
use async_trait::async_trait;
use cadence_core::domain::FollowUpPlan;
use cadence_core::error::{AppError, Result};
use cadence_core::port::FollowUpStore;
use sqlx::SqlitePool;
use tracing::debug;

pub struct SqliteFollowUpStore {
    pool: SqlitePool,
}

impl SqliteFollowUpStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowUpStore for SqliteFollowUpStore {
    async fn apply(&self, plan: &FollowUpPlan) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Claim the interaction first; a second delivery stops here
        let claimed = sqlx::query(
            "UPDATE interactions SET processed_at = ? WHERE id = ? AND processed_at IS NULL",
        )
        .bind(plan.processed_at)
        .bind(&plan.interaction_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if claimed.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Interaction {} already processed",
                plan.interaction_id
            )));
        }

        if let Some(lead_id) = &plan.lead_id {
            update_lead_fields(&mut *tx, lead_id, &plan.lead_update).await?;

            for id in &plan.complete_tasks {
                sqlx::query("UPDATE tasks SET completed = 1 WHERE id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
            }

            for id in &plan.delete_tasks {
                sqlx::query("DELETE FROM tasks WHERE id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
            }

            for task in &plan.new_tasks {
                insert_task(&mut *tx, task).await?;
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(interaction_id = %plan.interaction_id, "Follow-up plan committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_lead, setup_test_db};
    use crate::{SqliteInteractionRepository, SqliteLeadRepository, SqliteTaskRepository};
    use cadence_core::domain::{
        InteractionKind, InteractionRecord, Lead, LeadUpdate, QuickLogType, Task, TaskNature,
    };
    use cadence_core::port::{InteractionRepository, LeadRepository, TaskRepository};

    struct Fixture {
        store: SqliteFollowUpStore,
        leads: SqliteLeadRepository,
        tasks: SqliteTaskRepository,
        interactions: SqliteInteractionRepository,
    }

    async fn fixture() -> Fixture {
        let pool = setup_test_db().await;
        seed_lead(&pool, &Lead::new("l-1", 0, "Amal")).await;
        let fixture = Fixture {
            store: SqliteFollowUpStore::new(pool.clone()),
            leads: SqliteLeadRepository::new(pool.clone()),
            tasks: SqliteTaskRepository::new(pool.clone()),
            interactions: SqliteInteractionRepository::new(pool),
        };
        for (id, description) in [("t-old", "Day 1 Follow-up"), ("t-done", "Day 3 Follow-up")] {
            fixture
                .tasks
                .insert(&Task::new(id, 0, "l-1", "Amal", description, TaskNature::Interactive, None))
                .await
                .unwrap();
        }
        fixture
            .interactions
            .insert(&InteractionRecord::new(
                "i-1",
                10,
                "l-1",
                InteractionKind::QuickLog {
                    log_type: QuickLogType::Unresponsive,
                    reasons: vec![],
                },
            ))
            .await
            .unwrap();
        fixture
    }

    fn plan(new_task_id: &str) -> FollowUpPlan {
        let mut plan = FollowUpPlan::new("i-1", 50).for_lead("l-1");
        plan.lead_update = LeadUpdate::default().afc_step(2).touched_at(50);
        plan.complete_tasks.push("t-done".into());
        plan.delete_tasks.push("t-old".into());
        plan.new_tasks.push(Task::new(
            new_task_id,
            50,
            "l-1",
            "Amal",
            "Day 3 Follow-up",
            TaskNature::Interactive,
            Some(500),
        ));
        plan
    }

    #[tokio::test]
    async fn test_plan_applied_with_marker() {
        let f = fixture().await;

        f.store.apply(&plan("t-new")).await.unwrap();

        let lead = f.leads.find_by_id(&"l-1".to_string()).await.unwrap().unwrap();
        assert_eq!(lead.afc_step, 2);
        assert_eq!(lead.last_interaction_at, Some(50));
        let open: Vec<String> = f
            .tasks
            .find_open_for_lead(&"l-1".to_string())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(open, vec!["t-new"]);
        assert!(f.tasks.find_by_id(&"t-old".to_string()).await.unwrap().is_none());
        assert!(f.interactions.find_unprocessed(10).await.unwrap().is_empty());

        // Redelivery is refused and changes nothing
        let err = f.store.apply(&plan("t-dup")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(f.tasks.find_by_id(&"t-dup".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_mid_plan_rolls_everything_back() {
        let f = fixture().await;
        // Reusing an existing task id fails on the final insert
        let bad = plan("t-done");

        assert!(f.store.apply(&bad).await.is_err());

        let lead = f.leads.find_by_id(&"l-1".to_string()).await.unwrap().unwrap();
        assert_eq!(lead.afc_step, 0);
        assert!(f.tasks.find_by_id(&"t-old".to_string()).await.unwrap().is_some());
        let done = f.tasks.find_by_id(&"t-done".to_string()).await.unwrap().unwrap();
        assert!(!done.completed);
        assert_eq!(f.interactions.find_unprocessed(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_lead_plan_only_marks() {
        let f = fixture().await;

        f.store.apply(&FollowUpPlan::new("i-1", 50)).await.unwrap();

        assert!(f.interactions.find_unprocessed(10).await.unwrap().is_empty());
        assert_eq!(
            f.tasks.find_open_for_lead(&"l-1".to_string()).await.unwrap().len(),
            2
        );
    }
}
