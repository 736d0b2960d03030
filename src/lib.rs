use std::sync::Arc;

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod router;
pub mod routes;
pub mod services;
pub mod store;

use auth::{CredentialStore, SessionManager};
use cache::{CacheStore, EntityCache};
use config::Config;
use metrics::RequestMetrics;
use services::{ResetMailer, TaskService, UserService};
use store::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionManager,
    pub users: UserService,
    pub tasks: TaskService,
    pub entities: EntityCache,
    pub metrics: Arc<RequestMetrics>,
    pub cache: Arc<dyn CacheStore>,
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    /// 组装所有服务，存储和缓存的具体实现由调用方决定
    pub fn new(
        config: Config,
        cache: Arc<dyn CacheStore>,
        store: Arc<dyn DocumentStore>,
        mailer: Arc<dyn ResetMailer>,
    ) -> Self {
        let entities = EntityCache::new(cache.clone(), store.clone(), &config);
        let sessions = SessionManager::new(&config, cache.clone(), entities.clone());
        let users = UserService::new(
            entities.clone(),
            CredentialStore::new(config.bcrypt_cost),
            sessions.clone(),
            mailer,
        );
        let tasks = TaskService::new(entities.clone(), config.require_future_expiration);
        let metrics = Arc::new(RequestMetrics::new(config.metrics_sample_capacity));

        Self {
            config: Arc::new(config),
            sessions,
            users,
            tasks,
            entities,
            metrics,
            cache,
            store,
        }
    }
}
