mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{FailingCache, app, app_with_cache};

#[tokio::test]
async fn health_reports_all_checks() {
    let app = app();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "status": "healthy",
            "checks": { "database": true, "cache": true, "api": true }
        })
    );
}

#[tokio::test]
async fn health_is_degraded_without_cache() {
    let app = app_with_cache(Arc::new(FailingCache));
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["cache"], false);
    assert_eq!(body["checks"]["database"], true);
}

#[tokio::test]
async fn sessions_fail_closed_when_cache_is_down() {
    let app = app_with_cache(Arc::new(FailingCache));

    // 实体缓存失败不影响注册
    let (status, _) = app.register("alice", "pw123", "a@x.com").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.register("alice", "pw123", "b@x.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 会话无法记录时不签发令牌
    let (status, body) = app.login("alice", "pw123").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn metrics_require_a_session() {
    let app = app();
    let (status, _) = app.send(Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn metrics_report_requests_cache_and_tasks() {
    let app = app();
    let token = app.signed_in("alice").await;
    let (_, created) = app.create_task(&token, "buy milk").await;
    let uri = format!("/task/{}", created["id"].as_str().unwrap());
    app.send(Method::GET, &uri, Some(&token), None).await;
    app.send(Method::GET, &uri, Some(&token), None).await;

    let (status, body) = app.send(Method::GET, "/metrics", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_tasks"], 1);
    assert_eq!(
        body["tasks_by_status"],
        json!({ "completed": 0, "in_progress": 0, "pending": 1 })
    );
    assert_eq!(body["overdue_tasks"], 0);
    assert_eq!(body["active_users"], 1);
    assert_eq!(body["error_rate"], 0.0);
    assert!(body["cache_hits"].as_u64().unwrap() >= 1);
    assert!(body["cache_misses"].as_u64().unwrap() >= 1);
    assert!(body["avg_response_time"].is_number());
    assert!(body["timestamp"].is_string());
    assert!(body["average_age_days"].is_number());
}
