use chrono::{DateTime, Utc};

use super::RequestContext;
use crate::cache::EntityCache;
use crate::error::{AppError, AppResult};
use crate::models::{CreateTask, NewTask, Task, TaskPatch, TaskStatus, parse_expire_date};
use crate::store::StoreError;

/// 任务服务：所有读写都先做归属检查
#[derive(Clone)]
pub struct TaskService {
    entities: EntityCache,
    require_future_expiration: bool,
}

impl TaskService {
    pub fn new(entities: EntityCache, require_future_expiration: bool) -> Self {
        Self {
            entities,
            require_future_expiration,
        }
    }

    pub async fn create(&self, ctx: &RequestContext, input: CreateTask) -> AppResult<Task> {
        let title = validate_title(input.title.as_deref())?;
        let status = match input.status.as_deref() {
            Some(raw) => raw.parse::<TaskStatus>()?,
            None => TaskStatus::Pending,
        };
        let raw_expire = input
            .expire_date
            .as_deref()
            .ok_or_else(|| AppError::Validation("expire_date is required.".to_string()))?;
        let expire_date = self.validate_expire_date(raw_expire)?;

        let task = self
            .entities
            .store()
            .insert_task(NewTask {
                owner_id: ctx.user_id.clone(),
                title,
                description: input.description.unwrap_or_default(),
                status,
                expire_date,
            })
            .await?;

        self.entities.invalidate_task_list(&ctx.user_id).await;
        tracing::info!("Task {} created by {}", task.id, ctx.user_id);
        Ok(task)
    }

    pub async fn get(&self, ctx: &RequestContext, task_id: &str) -> AppResult<Task> {
        let task = self
            .entities
            .task_by_id(task_id)
            .await?
            .ok_or_else(task_not_found)?;
        // 缓存命中同样要检查归属
        ensure_owner(ctx, &task)?;
        Ok(task)
    }

    pub async fn list_for_owner(&self, ctx: &RequestContext) -> AppResult<Vec<Task>> {
        Ok(self.entities.tasks_for_owner(&ctx.user_id).await?)
    }

    pub async fn update(&self, ctx: &RequestContext, task_id: &str, patch: TaskPatch) -> AppResult<Task> {
        if patch.is_empty() {
            return Err(AppError::Validation("No fields to update.".to_string()));
        }

        // 归属检查可以走缓存，但被修改的记录必须从存储读取，
        // 否则失效失败后残留的旧快照会覆盖之前的更新
        self.get(ctx, task_id).await?;
        let mut task = self
            .entities
            .store()
            .find_task(task_id)
            .await?
            .ok_or_else(task_not_found)?;
        ensure_owner(ctx, &task)?;

        if let Some(title) = patch.title.as_deref() {
            task.title = validate_title(Some(title))?;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status.as_deref() {
            task.status = status.parse()?;
        }
        if let Some(raw) = patch.expire_date.as_deref() {
            task.expire_date = self.validate_expire_date(raw)?;
        }

        self.entities
            .store()
            .replace_task(&task)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => task_not_found(),
                other => AppError::from(other),
            })?;

        self.entities.invalidate_task(&task.id, &task.owner_id).await;
        tracing::info!("Task {} updated by {}", task.id, ctx.user_id);
        Ok(task)
    }

    pub async fn delete(&self, ctx: &RequestContext, task_id: &str) -> AppResult<()> {
        let task = self.get(ctx, task_id).await?;
        let deleted = self.entities.store().delete_task(&task.id).await?;

        // 即使记录已被并发删除，也要清掉可能残留的缓存
        self.entities.invalidate_task(&task.id, &task.owner_id).await;
        if !deleted {
            return Err(task_not_found());
        }
        tracing::info!("Task {} deleted by {}", task.id, ctx.user_id);
        Ok(())
    }

    fn validate_expire_date(&self, raw: &str) -> AppResult<DateTime<Utc>> {
        let expire_date = parse_expire_date(raw)?;
        if self.require_future_expiration && expire_date <= Utc::now() {
            return Err(AppError::Validation(
                "expire_date must be in the future.".to_string(),
            ));
        }
        Ok(expire_date)
    }
}

fn validate_title(title: Option<&str>) -> AppResult<String> {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(AppError::Validation("Title is required.".to_string())),
    }
}

fn ensure_owner(ctx: &RequestContext, task: &Task) -> AppResult<()> {
    if task.owner_id != ctx.user_id {
        tracing::warn!("User {} denied access to task {}", ctx.user_id, task.id);
        return Err(AppError::Forbidden);
    }
    Ok(())
}

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".to_string())
}
