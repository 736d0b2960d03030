use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    error::AppResult,
    models::{CreateTask, Task, TaskPatch},
    routes::ApiJson,
    services::RequestContext,
};

#[axum::debug_handler]
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<Vec<Task>>> {
    Ok(Json(state.tasks.list_for_owner(&ctx).await?))
}

#[axum::debug_handler]
pub async fn create_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ApiJson(req): ApiJson<CreateTask>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let task = state.tasks.create(&ctx, req).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[axum::debug_handler]
pub async fn get_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(task_id): Path<String>,
) -> AppResult<Json<Task>> {
    Ok(Json(state.tasks.get(&ctx, &task_id).await?))
}

#[axum::debug_handler]
pub async fn update_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(task_id): Path<String>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> AppResult<Json<Task>> {
    Ok(Json(state.tasks.update(&ctx, &task_id, patch).await?))
}

#[axum::debug_handler]
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(task_id): Path<String>,
) -> AppResult<StatusCode> {
    state.tasks.delete(&ctx, &task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
