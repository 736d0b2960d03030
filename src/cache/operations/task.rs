use super::EntityCache;
use crate::cache::keys::{task_by_id_key, task_list_key};
use crate::models::Task;
use crate::store::StoreResult;

/// 任务缓存操作
impl EntityCache {
    pub async fn task_by_id(&self, task_id: &str) -> StoreResult<Option<Task>> {
        let key = task_by_id_key(task_id);
        if let Some(task) = self.get::<Task>(&key).await {
            return Ok(Some(task));
        }

        let task = self.store().find_task(task_id).await?;
        if let Some(ref t) = task {
            self.put(&key, t, self.entity_ttl()).await;
        }
        Ok(task)
    }

    /// 用户的任务列表，列表变化频繁，使用较短的过期时间
    pub async fn tasks_for_owner(&self, owner_id: &str) -> StoreResult<Vec<Task>> {
        let key = task_list_key(owner_id);
        if let Some(tasks) = self.get::<Vec<Task>>(&key).await {
            return Ok(tasks);
        }

        let tasks = self.store().list_tasks_by_owner(owner_id).await?;
        self.put(&key, &tasks, self.list_ttl()).await;
        Ok(tasks)
    }

    pub async fn invalidate_task_list(&self, owner_id: &str) {
        self.invalidate(&task_list_key(owner_id)).await;
    }

    /// 任务写入后同时清理单条缓存和所属用户的列表缓存
    pub async fn invalidate_task(&self, task_id: &str, owner_id: &str) {
        self.invalidate(&task_by_id_key(task_id)).await;
        self.invalidate_task_list(owner_id).await;
    }
}
