mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{EntityOutageCache, app, app_with_cache, tomorrow};

#[tokio::test]
async fn alice_creates_reads_and_deletes_a_task() {
    let app = app();
    let (status, _) = app.register("alice", "pw123", "a@x.com").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.login("alice", "pw123").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, created) = app.create_task(&token, "buy milk").await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["status"], "pending");

    let uri = format!("/task/{}", id);
    let (status, fetched) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "buy milk");
    assert_eq!(fetched, created);

    let (status, body) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, body) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Task not found" }));
}

#[tokio::test]
async fn other_users_cannot_touch_a_task() {
    let app = app();
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    let (_, created) = app.create_task(&alice, "secret").await;
    let uri = format!("/task/{}", created["id"].as_str().unwrap());

    // alice 先读一次，让任务进入缓存
    app.send(Method::GET, &uri, Some(&alice), None).await;

    let (status, body) = app.send(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Not user's task" }));

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&bob), Some(json!({ "title": "mine" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, bob_tasks) = app.send(Method::GET, "/task", Some(&bob), None).await;
    assert_eq!(bob_tasks, json!([]));
}

#[tokio::test]
async fn update_is_visible_through_warm_caches() {
    let app = app();
    let token = app.signed_in("alice").await;
    let (_, created) = app.create_task(&token, "buy milk").await;
    let uri = format!("/task/{}", created["id"].as_str().unwrap());

    app.send(Method::GET, &uri, Some(&token), None).await;
    app.send(Method::GET, "/task", Some(&token), None).await;

    let (status, updated) = app
        .send(
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "status": "completed", "title": "buy oat milk" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "completed");

    let (_, fetched) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(fetched["title"], "buy oat milk");
    assert_eq!(fetched["status"], "completed");
    assert_eq!(fetched["expire_date"], created["expire_date"]);

    let (_, list) = app.send(Method::GET, "/task", Some(&token), None).await;
    assert_eq!(list[0]["status"], "completed");
}

#[tokio::test]
async fn update_rejects_unknown_fields() {
    let app = app();
    let token = app.signed_in("alice").await;
    let (_, created) = app.create_task(&token, "buy milk").await;
    let uri = format!("/task/{}", created["id"].as_str().unwrap());

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "owner_id": "bob" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, fetched) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(fetched["owner_id"], created["owner_id"]);
}

#[tokio::test]
async fn create_validates_fields() {
    let app = app();
    let token = app.signed_in("alice").await;

    let cases = [
        json!({ "title": "", "status": "pending", "expire_date": tomorrow() }),
        json!({ "title": "x", "status": "done", "expire_date": tomorrow() }),
        json!({ "title": "x", "status": "pending", "expire_date": "soon" }),
        json!({ "title": "x", "status": "pending", "expire_date": "2001-01-01T00:00:00Z" }),
        json!({ "title": "x", "status": "pending" }),
    ];
    for case in cases {
        let (status, body) = app.send(Method::POST, "/task", Some(&token), Some(case)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    }
}

#[tokio::test]
async fn list_only_returns_own_tasks() {
    let app = app();
    let alice = app.signed_in("alice").await;
    let bob = app.signed_in("bob").await;
    app.create_task(&alice, "one").await;
    app.create_task(&alice, "two").await;
    app.create_task(&bob, "three").await;

    let (status, list) = app.send(Method::GET, "/task", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["one", "two"]);
}

#[tokio::test]
async fn entity_cache_outage_falls_back_to_store() {
    let app = app_with_cache(Arc::new(EntityOutageCache::new()));
    let token = app.signed_in("alice").await;

    let (status, created) = app.create_task(&token, "buy milk").await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/task/{}", created["id"].as_str().unwrap());

    let (status, fetched) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["title"], "buy milk");

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&token), Some(json!({ "description": "2l" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
