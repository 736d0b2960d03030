use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::{DocumentStore, StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{NewTask, NewUser, Task, User};

#[derive(Default)]
struct Collections {
    users: HashMap<String, User>,
    tasks: HashMap<String, Task>,
}

/// 进程内文档存储，没有配置 DATABASE_URL 时使用，也用于测试
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut inner = self.inner.write();

        // 与数据库唯一索引保持一致
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username"));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }

        let record = User {
            id: Uuid::new_v4().to_string(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            last_login: None,
            created_at: Utc::now(),
        };
        inner.users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().users.get(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .inner
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_last_login(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let user = inner.users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.last_login = Some(at);
        Ok(())
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let user = inner.users.get_mut(id).ok_or(StoreError::NotFound)?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let record = Task {
            id: Uuid::new_v4().to_string(),
            owner_id: task.owner_id,
            title: task.title,
            description: task.description,
            status: task.status,
            expire_date: task.expire_date,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .tasks
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_task(&self, id: &str) -> StoreResult<Option<Task>> {
        Ok(self.inner.read().tasks.get(id).cloned())
    }

    async fn list_tasks_by_owner(&self, owner_id: &str) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .inner
            .read()
            .tasks
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn replace_task(&self, task: &Task) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let existing = inner.tasks.get_mut(&task.id).ok_or(StoreError::NotFound)?;
        *existing = task.clone();
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> StoreResult<bool> {
        Ok(self.inner.write().tasks.remove(id).is_some())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
