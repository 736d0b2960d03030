use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, FromRow, PgPool};
use uuid::Uuid;

use super::{DocumentStore, StoreError, StoreResult, TaskStore, UserStore, with_timeout};
use crate::models::{NewTask, NewUser, Task, TaskStatus, User};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        last_login TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        CONSTRAINT users_username_key UNIQUE (username),
        CONSTRAINT users_email_key UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id TEXT PRIMARY KEY,
        owner_id TEXT NOT NULL REFERENCES users (id),
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL,
        expire_date TIMESTAMPTZ NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS tasks_owner_id_idx ON tasks (owner_id)",
];

const USER_COLUMNS: &str = "id, username, email, password_hash, last_login, created_at";
const TASK_COLUMNS: &str = "id, owner_id, title, description, status, expire_date, created_at";

/// 数据库中的任务行，status 以文本保存
#[derive(Debug, FromRow)]
struct TaskRow {
    id: String,
    owner_id: String,
    title: String,
    description: String,
    status: String,
    expire_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<TaskStatus>().map_err(|_| {
            StoreError::Unavailable(format!("task {} has unknown status {}", row.id, row.status))
        })?;
        Ok(Task {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            description: row.description,
            status,
            expire_date: row.expire_date,
            created_at: row.created_at,
        })
    }
}

/// Postgres 文档存储
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub async fn connect(database_url: &str, timeout: Duration) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(timeout)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET application_name = 'task_manager';").await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;

        let store = Self::from_pool(pool, timeout);
        store.ensure_schema().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// 建表（幂等）
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            with_timeout(self.timeout, async {
                sqlx::query(statement)
                    .execute(&self.pool)
                    .await
                    .map_err(map_sqlx_error)
            })
            .await?;
        }
        tracing::info!("Document store schema ready");
        Ok(())
    }

    async fn find_user_where(&self, column: &str, value: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        with_timeout(self.timeout, async {
            sqlx::query_as::<_, User>(&sql)
                .bind(value)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)
        })
        .await
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some("users_email_key") => "email",
                _ => "username",
            };
            return StoreError::Duplicate(field);
        }
    }
    tracing::error!("Document store error: {:?}", err);
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING {}",
            USER_COLUMNS
        );
        let id = Uuid::new_v4().to_string();
        with_timeout(self.timeout, async {
            sqlx::query_as::<_, User>(&sql)
                .bind(&id)
                .bind(&user.username)
                .bind(&user.email)
                .bind(&user.password_hash)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)
        })
        .await
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.find_user_where("id", id).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.find_user_where("username", username).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_user_where("email", email).await
    }

    async fn update_last_login(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let result = with_timeout(self.timeout, async {
            sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
                .bind(at)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> StoreResult<()> {
        let result = with_timeout(self.timeout, async {
            sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
                .bind(password_hash)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (id, owner_id, title, description, status, expire_date, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING {}",
            TASK_COLUMNS
        );
        let id = Uuid::new_v4().to_string();
        let row = with_timeout(self.timeout, async {
            sqlx::query_as::<_, TaskRow>(&sql)
                .bind(&id)
                .bind(&task.owner_id)
                .bind(&task.title)
                .bind(&task.description)
                .bind(task.status.as_str())
                .bind(task.expire_date)
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)
        })
        .await?;

        Task::try_from(row)
    }

    async fn find_task(&self, id: &str) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS);
        let row = with_timeout(self.timeout, async {
            sqlx::query_as::<_, TaskRow>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)
        })
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn list_tasks_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks WHERE owner_id = $1 ORDER BY created_at, id",
            TASK_COLUMNS
        );
        let rows = with_timeout(self.timeout, async {
            sqlx::query_as::<_, TaskRow>(&sql)
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)
        })
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn replace_task(&self, task: &Task) -> StoreResult<()> {
        let result = with_timeout(self.timeout, async {
            sqlx::query(
                "UPDATE tasks SET title = $1, description = $2, status = $3, expire_date = $4 \
                 WHERE id = $5",
            )
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status.as_str())
            .bind(task.expire_date)
            .bind(&task.id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> StoreResult<bool> {
        let result = with_timeout(self.timeout, async {
            sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)
        })
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        with_timeout(self.timeout, async {
            sqlx::query("SELECT 1")
                .execute(&self.pool)
                .await
                .map(|_| ())
                .map_err(map_sqlx_error)
        })
        .await
    }
}
