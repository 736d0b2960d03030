#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use task_manager::{
    AppState,
    cache::{CacheError, CacheResult, CacheStore, MemoryCache},
    config::Config,
    router::build_router,
    services::LogMailer,
    store::{DocumentStore, MemoryStore},
};
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub fn test_config() -> Config {
    let mut config = Config::new("integration-test-secret");
    config.bcrypt_cost = 4;
    config
}

pub fn app() -> TestApp {
    app_with_cache(Arc::new(MemoryCache::new()))
}

pub fn app_with_cache(cache: Arc<dyn CacheStore>) -> TestApp {
    app_with(test_config(), cache)
}

pub fn app_with_config(config: Config) -> TestApp {
    app_with(config, Arc::new(MemoryCache::new()))
}

fn app_with(config: Config, cache: Arc<dyn CacheStore>) -> TestApp {
    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let state = AppState::new(config, cache, store, Arc::new(LogMailer));
    TestApp {
        router: build_router(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn register(&self, username: &str, password: &str, email: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({ "username": username, "password": password, "email": email })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    /// 注册并登录，返回会话令牌
    pub async fn signed_in(&self, username: &str) -> String {
        let email = format!("{}@x.com", username);
        let (status, _) = self.register(username, "pw123", &email).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = self.login(username, "pw123").await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_task(&self, token: &str, title: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/task",
            Some(token),
            Some(json!({
                "title": title,
                "description": "",
                "status": "pending",
                "expire_date": tomorrow(),
            })),
        )
        .await
    }
}

pub fn tomorrow() -> String {
    (chrono::Utc::now() + chrono::Duration::days(1)).to_rfc3339()
}

/// 所有操作都失败的缓存
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn take(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn ping(&self) -> CacheResult<()> {
        Err(CacheError::Backend("connection refused".into()))
    }
}

/// 令牌键正常工作，实体键（用户、任务）全部超时
pub struct EntityOutageCache {
    inner: MemoryCache,
}

impl EntityOutageCache {
    pub fn new() -> Self {
        Self {
            inner: MemoryCache::new(),
        }
    }

    fn check(&self, key: &str) -> CacheResult<()> {
        if key.starts_with("session:") || key.starts_with("reset:") {
            Ok(())
        } else {
            Err(CacheError::Timeout(Duration::from_millis(250)))
        }
    }
}

#[async_trait]
impl CacheStore for EntityOutageCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.check(key)?;
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.check(key)?;
        self.inner.set_ex(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.check(key)?;
        self.inner.delete(key).await
    }

    async fn take(&self, key: &str) -> CacheResult<Option<String>> {
        self.check(key)?;
        self.inner.take(key).await
    }

    async fn ping(&self) -> CacheResult<()> {
        self.inner.ping().await
    }
}
