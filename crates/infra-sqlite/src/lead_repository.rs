// SQLite LeadRepository Implementation

use crate::error::{check_lookup_size, map_sqlx_error};
use async_trait::async_trait;
use cadence_core::domain::{Lead, LeadId, LeadStatus, LeadUpdate, Phone};
use cadence_core::error::{AppError, Result};
use cadence_core::port::{CascadeStats, LeadRepository};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

pub struct SqliteLeadRepository {
    pool: SqlitePool,
}

impl SqliteLeadRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadRepository for SqliteLeadRepository {
    async fn insert(&self, lead: &Lead) -> Result<()> {
        let phones = serde_json::to_string(&lead.phones)?;

        sqlx::query(
            r#"
            INSERT INTO leads (
                id, name, email, phones, relationship, course,
                status, afc_step, has_engaged, on_follow_list,
                last_interaction_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&lead.id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&phones)
        .bind(&lead.relationship)
        .bind(&lead.course)
        .bind(lead.status.map(|s| s.to_string()))
        .bind(i64::from(lead.afc_step))
        .bind(lead.has_engaged)
        .bind(lead.on_follow_list)
        .bind(lead.last_interaction_at)
        .bind(lead.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>> {
        let row = sqlx::query_as::<_, LeadRow>("SELECT * FROM leads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(LeadRow::into_lead).transpose()
    }

    async fn find_by_ids(&self, ids: &[LeadId]) -> Result<Vec<Lead>> {
        check_lookup_size(ids.len())?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM leads WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows: Vec<LeadRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(LeadRow::into_lead).collect()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Lead>> {
        let row = sqlx::query_as::<_, LeadRow>(
            "SELECT * FROM leads WHERE email = ? ORDER BY created_at LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(LeadRow::into_lead).transpose()
    }

    async fn list(&self, limit: i64) -> Result<Vec<Lead>> {
        let rows: Vec<LeadRow> = sqlx::query_as(
            "SELECT * FROM leads ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(LeadRow::into_lead).collect()
    }

    async fn replace(&self, lead: &Lead) -> Result<()> {
        let phones = serde_json::to_string(&lead.phones)?;

        let result = sqlx::query(
            r#"
            UPDATE leads
            SET name = ?, email = ?, phones = ?, relationship = ?, course = ?,
                status = ?, afc_step = ?, has_engaged = ?, on_follow_list = ?,
                last_interaction_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&phones)
        .bind(&lead.relationship)
        .bind(&lead.course)
        .bind(lead.status.map(|s| s.to_string()))
        .bind(i64::from(lead.afc_step))
        .bind(lead.has_engaged)
        .bind(lead.on_follow_list)
        .bind(lead.last_interaction_at)
        .bind(&lead.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Lead {} not found", lead.id)));
        }
        Ok(())
    }

    async fn update_fields(&self, id: &LeadId, update: &LeadUpdate) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        update_lead_fields(&mut conn, id, update).await
    }

    async fn delete_cascade(&self, id: &LeadId) -> Result<CascadeStats> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let tasks = sqlx::query("DELETE FROM tasks WHERE lead_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let interactions = sqlx::query("DELETE FROM interactions WHERE lead_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let lead = sqlx::query("DELETE FROM leads WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        // Dropping the transaction rolls the child deletes back
        if lead.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Lead {} not found", id)));
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        let stats = CascadeStats {
            tasks_deleted: tasks.rows_affected(),
            interactions_deleted: interactions.rows_affected(),
        };
        debug!(lead_id = %id, ?stats, "Cascade delete committed");
        Ok(stats)
    }
}

/// Field-level lead update, shared with the follow-up store transaction
pub(crate) async fn update_lead_fields(
    conn: &mut SqliteConnection,
    id: &LeadId,
    update: &LeadUpdate,
) -> Result<()> {
    if update.is_empty() {
        return Ok(());
    }

    // NULL parameters leave the column untouched
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET status = COALESCE(?, status),
            afc_step = COALESCE(?, afc_step),
            has_engaged = COALESCE(?, has_engaged),
            last_interaction_at = COALESCE(?, last_interaction_at)
        WHERE id = ?
        "#,
    )
    .bind(update.status.map(|s| s.to_string()))
    .bind(update.afc_step.map(i64::from))
    .bind(update.has_engaged)
    .bind(update.last_interaction_at)
    .bind(id)
    .execute(conn)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Lead {} not found", id)));
    }
    Ok(())
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: String,
    name: String,
    email: Option<String>,
    phones: String, // JSON array
    relationship: String,
    course: Option<String>,
    status: Option<String>,
    afc_step: i64,
    has_engaged: bool,
    on_follow_list: bool,
    last_interaction_at: Option<i64>,
    created_at: i64,
}

impl LeadRow {
    fn into_lead(self) -> Result<Lead> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<LeadStatus>)
            .transpose()?;
        let phones: Vec<Phone> = serde_json::from_str(&self.phones)?;
        let afc_step = u8::try_from(self.afc_step).map_err(|_| {
            AppError::Database(format!("Lead {} has invalid afc_step {}", self.id, self.afc_step))
        })?;

        Ok(Lead {
            id: self.id,
            name: self.name,
            email: self.email,
            phones,
            relationship: self.relationship,
            course: self.course,
            status,
            afc_step,
            has_engaged: self.has_engaged,
            on_follow_list: self.on_follow_list,
            last_interaction_at: self.last_interaction_at,
            created_at: self.created_at,
        })
    }
}
