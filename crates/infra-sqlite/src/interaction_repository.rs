// SQLite InteractionRepository Implementation
//
// The interaction kind is stored twice: a short label for queries and the
// full JSON payload.

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use cadence_core::domain::{InteractionId, InteractionKind, InteractionRecord, LeadId};
use cadence_core::error::{AppError, Result};
use cadence_core::port::InteractionRepository;
use sqlx::SqlitePool;

pub struct SqliteInteractionRepository {
    pool: SqlitePool,
}

impl SqliteInteractionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionRepository for SqliteInteractionRepository {
    async fn insert(&self, record: &InteractionRecord) -> Result<()> {
        let payload = serde_json::to_string(&record.kind)?;

        sqlx::query(
            r#"
            INSERT INTO interactions (id, lead_id, task_id, kind, payload, notes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.lead_id)
        .bind(&record.task_id)
        .bind(record.kind.label())
        .bind(&payload)
        .bind(&record.notes)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_for_lead(&self, lead_id: &LeadId) -> Result<Vec<InteractionRecord>> {
        let rows: Vec<InteractionRow> = sqlx::query_as(
            "SELECT * FROM interactions WHERE lead_id = ? ORDER BY created_at, rowid",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(InteractionRow::into_record).collect()
    }

    async fn find_unprocessed(&self, limit: i64) -> Result<Vec<InteractionRecord>> {
        let rows: Vec<InteractionRow> = sqlx::query_as(
            r#"
            SELECT * FROM interactions
            WHERE processed_at IS NULL AND failed_at IS NULL
            ORDER BY created_at, rowid
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(InteractionRow::into_record).collect()
    }

    async fn record_failure(&self, id: &InteractionId, error: &str) -> Result<u32> {
        let attempts: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE interactions
            SET attempts = attempts + 1, last_error = ?
            WHERE id = ?
            RETURNING attempts
            "#,
        )
        .bind(error)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let attempts =
            attempts.ok_or_else(|| AppError::NotFound(format!("Interaction {} not found", id)))?;
        Ok(u32::try_from(attempts).unwrap_or(u32::MAX))
    }

    async fn mark_failed(&self, id: &InteractionId, at_millis: i64) -> Result<()> {
        sqlx::query("UPDATE interactions SET failed_at = ? WHERE id = ? AND failed_at IS NULL")
            .bind(at_millis)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct InteractionRow {
    id: String,
    lead_id: String,
    task_id: Option<String>,
    payload: String, // JSON InteractionKind
    notes: Option<String>,
    created_at: i64,
}

impl InteractionRow {
    fn into_record(self) -> Result<InteractionRecord> {
        let kind: InteractionKind = serde_json::from_str(&self.payload)?;
        Ok(InteractionRecord {
            id: self.id,
            lead_id: self.lead_id,
            task_id: self.task_id,
            kind,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_lead, setup_test_db};
    use cadence_core::domain::{
        FeedbackCategory, Lead, Outcome, Perception, QuickLogType, Sentiment,
    };

    async fn repo() -> SqliteInteractionRepository {
        let pool = setup_test_db().await;
        seed_lead(&pool, &Lead::new("l-1", 0, "Amal")).await;
        SqliteInteractionRepository::new(pool)
    }

    fn quick(id: &str, created_at: i64) -> InteractionRecord {
        InteractionRecord::new(
            id,
            created_at,
            "l-1",
            InteractionKind::QuickLog {
                log_type: QuickLogType::Withdrawn,
                reasons: vec!["Too expensive".into()],
            },
        )
    }

    #[tokio::test]
    async fn test_every_kind_survives_storage() {
        let repo = repo().await;
        let records = vec![
            quick("i-1", 1).with_task("t-1"),
            InteractionRecord::new(
                "i-2",
                2,
                "l-1",
                InteractionKind::Feedback {
                    perceptions: vec![Perception {
                        category: FeedbackCategory::Price,
                        sentiment: Sentiment::Negative,
                    }],
                    objections: vec!["Budget".into()],
                },
            ),
            InteractionRecord::new(
                "i-3",
                3,
                "l-1",
                InteractionKind::Outcome(Outcome::EventScheduled {
                    event_type: "Demo".into(),
                    at: 99,
                    rescheduled_from: Some(50),
                }),
            )
            .with_notes("Booked"),
            InteractionRecord::new("i-4", 4, "l-1", InteractionKind::Outcome(Outcome::Info)),
        ];
        for record in &records {
            repo.insert(record).await.unwrap();
        }

        let stored = repo.find_for_lead(&"l-1".to_string()).await.unwrap();
        assert_eq!(stored, records);
    }

    #[tokio::test]
    async fn test_processed_cursor() {
        let repo = repo().await;
        repo.insert(&quick("i-2", 20)).await.unwrap();
        repo.insert(&quick("i-1", 10)).await.unwrap();
        repo.insert(&quick("i-3", 30)).await.unwrap();

        let pending: Vec<String> = repo
            .find_unprocessed(2)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(pending, vec!["i-1", "i-2"]);

        sqlx::query("UPDATE interactions SET processed_at = 100 WHERE id = 'i-2'")
            .execute(&repo.pool)
            .await
            .unwrap();

        let pending: Vec<String> = repo
            .find_unprocessed(10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(pending, vec!["i-1", "i-3"]);
    }

    #[tokio::test]
    async fn test_failures_counted_then_parked() {
        let repo = repo().await;
        repo.insert(&quick("i-1", 10)).await.unwrap();
        repo.insert(&quick("i-2", 20)).await.unwrap();
        let id = "i-1".to_string();

        assert_eq!(repo.record_failure(&id, "busy").await.unwrap(), 1);
        assert_eq!(repo.record_failure(&id, "busy again").await.unwrap(), 2);
        // Still pending until parked
        assert_eq!(repo.find_unprocessed(10).await.unwrap().len(), 2);

        repo.mark_failed(&id, 500).await.unwrap();
        let pending = repo.find_unprocessed(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "i-2");

        let (last_error, failed_at): (Option<String>, Option<i64>) =
            sqlx::query_as("SELECT last_error, failed_at FROM interactions WHERE id = 'i-1'")
                .fetch_one(&repo.pool)
                .await
                .unwrap();
        assert_eq!(last_error.as_deref(), Some("busy again"));
        assert_eq!(failed_at, Some(500));

        assert!(repo
            .record_failure(&"ghost".to_string(), "x")
            .await
            .is_err());
    }
}
