// 文档存储适配层
// 用户和任务的持久化接口，以及 Postgres / 内存两种实现

mod memory;
mod postgres;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{NewTask, NewUser, Task, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// 唯一约束冲突，携带冲突的字段名
    #[error("duplicate value for {0}")]
    Duplicate(&'static str),
    #[error("record not found")]
    NotFound,
    #[error("document store timed out after {0:?}")]
    Timeout(Duration),
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn update_last_login(&self, id: &str, at: chrono::DateTime<chrono::Utc>) -> StoreResult<()>;
    async fn update_password(&self, id: &str, password_hash: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task>;
    async fn find_task(&self, id: &str) -> StoreResult<Option<Task>>;
    async fn list_tasks_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Task>>;
    /// 整体替换任务记录，记录不存在时返回 `StoreError::NotFound`
    async fn replace_task(&self, task: &Task) -> StoreResult<()>;
    /// 返回是否真的删除了记录
    async fn delete_task(&self, id: &str) -> StoreResult<bool>;
}

/// 用户和任务共用的文档存储
#[async_trait]
pub trait DocumentStore: UserStore + TaskStore {
    async fn ping(&self) -> StoreResult<()>;
}

/// 给每次存储调用加上超时限制
pub(crate) async fn with_timeout<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
