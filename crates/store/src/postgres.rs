//! Postgres-backed repository.
//!
//! Every task/collection statement includes the owning `user_id` in its
//! predicate; ownership is enforced here, not only at the edge. Mutations
//! report the fused `NotFoundOrForbidden` outcome when zero rows match.
//!
//! ## Error mapping
//!
//! | Postgres error code | StoreError |
//! |---|---|
//! | `23505` (unique violation) | `Conflict` |
//! | anything else | `Database` |

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use tracing::{info, instrument, warn};

use taskloom_core::{Collection, CollectionId, Task, TaskId, User, UserId};

use crate::error::StoreError;
use crate::repository::{NewCollection, NewTask, Repository, TaskFilter};

const TASK_COLUMNS: &str =
    "id, user_id, collection_id, name, text, create_time, complete, complete_at";

const COLLECTION_COLUMNS: &str = "id, user_id, name, color, icon, created_at";

/// Postgres repository over a shared connection pool.
///
/// The pool is thread-safe; the repository is cheap to clone.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a startup retry loop (the database container often comes
    /// up after this service).
    pub async fn connect(
        options: PgConnectOptions,
        attempts: u32,
        delay: Duration,
    ) -> Result<Self, StoreError> {
        let mut last_err = None;
        for attempt in 1..=attempts {
            match PgPoolOptions::new()
                .max_connections(10)
                .connect_with(options.clone())
                .await
            {
                Ok(pool) => {
                    info!("connected to database");
                    return Ok(Self::new(pool));
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "database connection failed, retrying");
                    last_err = Some(e);
                    tokio::time::sleep(delay).await;
                }
            }
        }
        Err(StoreError::database(format!(
            "could not connect to database: {}",
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Create the tables and indexes when they do not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                username VARCHAR(50) UNIQUE NOT NULL,
                password_hash VARCHAR(60) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create users table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name VARCHAR(100) NOT NULL,
                color VARCHAR(7) NOT NULL DEFAULT '#2564cf',
                icon VARCHAR(50) NOT NULL DEFAULT '📁',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create collections table", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                collection_id BIGINT REFERENCES collections(id) ON DELETE SET NULL,
                name VARCHAR(255) NOT NULL,
                text TEXT NOT NULL DEFAULT '',
                create_time TIMESTAMPTZ NOT NULL DEFAULT now(),
                complete BOOLEAN NOT NULL DEFAULT FALSE,
                complete_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create tasks table", e))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create tasks index", e))?;

        info!("database schema ready");
        Ok(())
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            username: row.username,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct TaskRow {
    id: i64,
    user_id: i64,
    collection_id: Option<i64>,
    name: String,
    text: String,
    create_time: DateTime<Utc>,
    complete: bool,
    complete_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: TaskId::new(row.id),
            user_id: UserId::new(row.user_id),
            collection_id: row.collection_id.map(CollectionId::new),
            name: row.name,
            text: row.text,
            create_time: row.create_time,
            complete: row.complete,
            complete_at: row.complete_at,
        }
    }
}

#[derive(FromRow)]
struct CollectionRow {
    id: i64,
    user_id: i64,
    name: String,
    color: String,
    icon: String,
    created_at: DateTime<Utc>,
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Collection {
            id: CollectionId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            color: row.color,
            icon: row.icon,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl Repository for PgRepository {
    #[instrument(skip(self, password_hash), err)]
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, NULL::varchar AS password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_username", e))?;

        row.map(User::from).ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("user_by_id", e))?;

        row.map(User::from).ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self, new), fields(owner = %owner), err)]
    async fn create_task(&self, owner: UserId, new: NewTask) -> Result<Task, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks (user_id, collection_id, name, text, complete, create_time)
            VALUES ($1, $2, $3, $4, FALSE, now())
            RETURNING {TASK_COLUMNS}
            "#,
        ))
        .bind(owner.get())
        .bind(new.collection_id.as_ref().map(CollectionId::get))
        .bind(&new.name)
        .bind(&new.text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_task", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn list_tasks(&self, owner: UserId, filter: TaskFilter) -> Result<Vec<Task>, StoreError> {
        let completion_clause = match filter {
            TaskFilter::All => "",
            TaskFilter::Completed => "AND complete = TRUE",
            TaskFilter::Uncompleted => "AND complete = FALSE",
        };

        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE user_id = $1 {completion_clause}
            ORDER BY create_time DESC, id DESC
            "#,
        ))
        .bind(owner.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tasks", e))?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id.get())
            .bind(owner.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_task", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFoundOrForbidden);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn complete_task(&self, id: TaskId, owner: UserId) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET complete = TRUE, complete_at = now()
            WHERE id = $1 AND user_id = $2 AND complete = FALSE
            "#,
        )
        .bind(id.get())
        .bind(owner.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("complete_task", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFoundOrForbidden);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn task_by_id(&self, id: TaskId, owner: UserId) -> Result<Task, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2",
        ))
        .bind(id.get())
        .bind(owner.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("task_by_id", e))?;

        row.map(Task::from).ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn task_by_name(&self, name: &str, owner: UserId) -> Result<Task, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE name = $1 AND user_id = $2
            ORDER BY create_time DESC, id DESC
            LIMIT 1
            "#,
        ))
        .bind(name)
        .bind(owner.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("task_by_name", e))?;

        row.map(Task::from).ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self, new), fields(owner = %owner), err)]
    async fn create_collection(
        &self,
        owner: UserId,
        new: NewCollection,
    ) -> Result<Collection, StoreError> {
        let row = sqlx::query_as::<_, CollectionRow>(&format!(
            r#"
            INSERT INTO collections (user_id, name, color, icon, created_at)
            VALUES ($1, $2, $3, $4, now())
            RETURNING {COLLECTION_COLUMNS}
            "#,
        ))
        .bind(owner.get())
        .bind(&new.name)
        .bind(&new.color)
        .bind(&new.icon)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_collection", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn list_collections(&self, owner: UserId) -> Result<Vec<Collection>, StoreError> {
        let rows = sqlx::query_as::<_, CollectionRow>(&format!(
            r#"
            SELECT {COLLECTION_COLUMNS} FROM collections
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        ))
        .bind(owner.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_collections", e))?;

        Ok(rows.into_iter().map(Collection::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn delete_collection(&self, id: CollectionId, owner: UserId) -> Result<(), StoreError> {
        // ON DELETE SET NULL on tasks.collection_id clears member references.
        let result = sqlx::query("DELETE FROM collections WHERE id = $1 AND user_id = $2")
            .bind(id.get())
            .bind(owner.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_collection", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFoundOrForbidden);
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn tasks_in_collection(
        &self,
        collection: CollectionId,
        owner: UserId,
    ) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            SELECT {TASK_COLUMNS} FROM tasks
            WHERE user_id = $1 AND collection_id = $2
            ORDER BY create_time DESC, id DESC
            "#,
        ))
        .bind(owner.get())
        .bind(collection.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("tasks_in_collection", e))?;

        Ok(rows.into_iter().map(Task::from).collect())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::conflict("Username already exists");
        }
    }
    StoreError::database(format!("{operation}: {err}"))
}
