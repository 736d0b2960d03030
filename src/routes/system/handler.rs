use axum::{
    Json,
    extract::{Extension, State},
};
use chrono::Utc;

use super::model::{HealthChecks, HealthResponse, MetricsResponse};
use crate::{AppState, error::AppResult, metrics::TaskStats, services::RequestContext};

#[axum::debug_handler]
pub async fn metrics(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<MetricsResponse>> {
    let tasks = state.tasks.list_for_owner(&ctx).await?;
    let now = Utc::now();
    let requests = state.metrics.snapshot();
    let cache = state.entities.stats();

    Ok(Json(MetricsResponse {
        active_users: requests.active_users,
        avg_response_time: requests.avg_response_time,
        error_rate: requests.error_rate,
        cache_hits: cache.hits(),
        cache_misses: cache.misses(),
        timestamp: now,
        tasks: TaskStats::from_tasks(&tasks, now),
    }))
}

/// 健康检查始终返回 200，依赖不可用时标记为 degraded
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (database, cache) = tokio::join!(state.store.ping(), state.cache.ping());
    if let Err(e) = &database {
        tracing::warn!("Health check: document store unavailable: {}", e);
    }
    if let Err(e) = &cache {
        tracing::warn!("Health check: cache unavailable: {}", e);
    }

    let checks = HealthChecks {
        database: database.is_ok(),
        cache: cache.is_ok(),
        api: true,
    };
    let status = if checks.database && checks.cache {
        "healthy"
    } else {
        "degraded"
    };
    Json(HealthResponse { status, checks })
}
