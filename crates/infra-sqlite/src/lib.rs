// Cadence Infrastructure - SQLite Adapter
// Implements: LeadRepository, TaskRepository, InteractionRepository, FollowUpStore

mod connection;
mod error;
mod followup_store;
mod interaction_repository;
mod lead_repository;
mod migration;
mod task_repository;

pub use connection::create_pool;
pub use followup_store::SqliteFollowUpStore;
pub use interaction_repository::SqliteInteractionRepository;
pub use lead_repository::SqliteLeadRepository;
pub use migration::run_migrations;
pub use task_repository::SqliteTaskRepository;

// Note: sqlx::Error conversion goes through error::map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{create_pool, run_migrations};
    use cadence_core::domain::Lead;
    use sqlx::SqlitePool;

    pub async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    /// Insert a bare lead row so tasks and interactions satisfy foreign keys
    pub async fn seed_lead(pool: &SqlitePool, lead: &Lead) {
        sqlx::query("INSERT INTO leads (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&lead.id)
            .bind(&lead.name)
            .bind(lead.created_at)
            .execute(pool)
            .await
            .unwrap();
    }
}
