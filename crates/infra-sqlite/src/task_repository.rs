// SQLite TaskRepository Implementation

use crate::error::{check_lookup_size, map_sqlx_error};
use async_trait::async_trait;
use cadence_core::domain::{LeadId, Task, TaskId, TaskNature};
use cadence_core::error::{AppError, Result};
use cadence_core::port::TaskRepository;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: &Task) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        insert_task(&mut conn, task).await
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(TaskRow::into_task).transpose()
    }

    async fn find_by_ids(&self, ids: &[TaskId]) -> Result<Vec<Task>> {
        check_lookup_size(ids.len())?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM tasks WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");

        let rows: Vec<TaskRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn find_open_for_lead(&self, lead_id: &LeadId) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE lead_id = ? AND completed = 0 ORDER BY created_at, rowid",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn find_overdue_interactive(&self, now_millis: i64) -> Result<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT * FROM tasks
            WHERE completed = 0 AND nature = ? AND due_at IS NOT NULL AND due_at < ?
            ORDER BY due_at
            "#,
        )
        .bind(TaskNature::Interactive.to_string())
        .bind(now_millis)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn list_open(&self, limit: i64) -> Result<Vec<Task>> {
        // Undated tasks last
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT * FROM tasks
            WHERE completed = 0
            ORDER BY due_at IS NULL, due_at, created_at
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(TaskRow::into_task).collect()
    }

    async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let previous: Option<bool> = sqlx::query_scalar("SELECT completed FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let previous =
            previous.ok_or_else(|| AppError::NotFound(format!("Task {} not found", id)))?;

        sqlx::query("UPDATE tasks SET completed = ? WHERE id = ?")
            .bind(completed)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(previous)
    }

    async fn delete(&self, id: &TaskId) -> Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

/// Shared by the repository and the follow-up store transaction
pub(crate) async fn insert_task(conn: &mut SqliteConnection, task: &Task) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO tasks (
            id, lead_id, lead_name, description, completed, nature, due_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.id)
    .bind(&task.lead_id)
    .bind(&task.lead_name)
    .bind(&task.description)
    .bind(task.completed)
    .bind(task.nature.to_string())
    .bind(task.due_at)
    .bind(task.created_at)
    .execute(conn)
    .await
    .map_err(map_sqlx_error)?;

    Ok(())
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: String,
    lead_id: String,
    lead_name: String,
    description: String,
    completed: bool,
    nature: String,
    due_at: Option<i64>,
    created_at: i64,
}

impl TaskRow {
    fn into_task(self) -> Result<Task> {
        Ok(Task {
            nature: self.nature.parse()?,
            id: self.id,
            lead_id: self.lead_id,
            lead_name: self.lead_name,
            description: self.description,
            completed: self.completed,
            due_at: self.due_at,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_lead, setup_test_db};
    use cadence_core::domain::Lead;

    async fn repo() -> SqliteTaskRepository {
        let pool = setup_test_db().await;
        seed_lead(&pool, &Lead::new("l-1", 0, "Amal")).await;
        SqliteTaskRepository::new(pool)
    }

    fn task(id: &str, nature: TaskNature, due_at: Option<i64>) -> Task {
        Task::new(id, 0, "l-1", "Amal", "Day 1 Follow-up", nature, due_at)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = repo().await;
        let original = task("t-1", TaskNature::Interactive, Some(500));
        repo.insert(&original).await.unwrap();

        let found = repo.find_by_id(&"t-1".to_string()).await.unwrap().unwrap();
        assert_eq!(found, original);
    }

    #[tokio::test]
    async fn test_task_requires_existing_lead() {
        let repo = repo().await;
        let orphan = Task::new("t-x", 0, "ghost", "Ghost", "Call", TaskNature::Interactive, None);
        assert!(repo.insert(&orphan).await.is_err());
    }

    #[tokio::test]
    async fn test_set_completed_returns_previous() {
        let repo = repo().await;
        repo.insert(&task("t-1", TaskNature::Interactive, None)).await.unwrap();
        let id = "t-1".to_string();

        assert!(!repo.set_completed(&id, true).await.unwrap());
        assert!(repo.set_completed(&id, true).await.unwrap());
        assert!(repo.set_completed(&id, false).await.unwrap());
        assert!(repo.find_open_for_lead(&"l-1".to_string()).await.unwrap().len() == 1);

        let err = repo.set_completed(&"nope".to_string(), true).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_overdue_interactive() {
        let repo = repo().await;
        repo.insert(&task("late", TaskNature::Interactive, Some(100))).await.unwrap();
        repo.insert(&task("soon", TaskNature::Interactive, Some(900))).await.unwrap();
        repo.insert(&task("chore", TaskNature::Procedural, Some(100))).await.unwrap();
        repo.insert(&task("undated", TaskNature::Interactive, None)).await.unwrap();
        let mut done = task("done", TaskNature::Interactive, Some(100));
        done.completed = true;
        repo.insert(&done).await.unwrap();

        let overdue: Vec<String> = repo
            .find_overdue_interactive(500)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(overdue, vec!["late"]);
    }

    #[tokio::test]
    async fn test_list_open_orders_by_due_date() {
        let repo = repo().await;
        repo.insert(&task("undated", TaskNature::Interactive, None)).await.unwrap();
        repo.insert(&task("later", TaskNature::Interactive, Some(900))).await.unwrap();
        repo.insert(&task("first", TaskNature::Procedural, Some(100))).await.unwrap();

        let ids: Vec<String> = repo
            .list_open(10)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["first", "later", "undated"]);
    }

    #[tokio::test]
    async fn test_find_by_ids_and_delete() {
        let repo = repo().await;
        for id in ["a", "b", "c"] {
            repo.insert(&task(id, TaskNature::Interactive, None)).await.unwrap();
        }
        repo.delete(&"b".to_string()).await.unwrap();

        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut found: Vec<String> = repo
            .find_by_ids(&ids)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        found.sort();
        assert_eq!(found, vec!["a", "c"]);
    }
}
