/// 缓存操作
/// 读穿透实体缓存（用户、任务、任务列表）以及令牌缓存
mod task;
mod token;
mod user;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::CacheStore;
use crate::config::Config;
use crate::store::DocumentStore;

pub use token::TokenCacheOperations;

/// 缓存命中统计
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
}

/// 实体缓存层。
///
/// 所有缓存操作失败时都只记录日志并退化为空操作，调用方回落到文档存储；
/// 缓存只是优化，不是依赖。
#[derive(Clone)]
pub struct EntityCache {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn DocumentStore>,
    entity_ttl: Duration,
    list_ttl: Duration,
    stats: Arc<CacheStats>,
}

impl EntityCache {
    pub fn new(cache: Arc<dyn CacheStore>, store: Arc<dyn DocumentStore>, config: &Config) -> Self {
        Self {
            cache,
            store,
            entity_ttl: config.entity_cache_ttl(),
            list_ttl: config.list_cache_ttl(),
            stats: Arc::new(CacheStats::default()),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn entity_ttl(&self) -> Duration {
        self.entity_ttl
    }

    pub fn list_ttl(&self) -> Duration {
        self.list_ttl
    }

    /// 读取缓存，`None` 表示未命中（包括缓存不可用和数据损坏）
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.cache.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.stats.record_miss();
                tracing::debug!("Cache miss: {}", key);
                return None;
            }
            Err(e) => {
                self.stats.record_miss();
                tracing::warn!("Cache read failed for {}, falling back to store: {}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                self.stats.record_hit();
                tracing::debug!("Cache hit: {}", key);
                Some(value)
            }
            Err(e) => {
                self.stats.record_miss();
                tracing::warn!("Discarding undecodable cache entry {}: {}", key, e);
                self.invalidate(key).await;
                None
            }
        }
    }

    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.cache.set_ex(key, &json, ttl).await {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        } else {
            tracing::debug!("Set cache: {} (ttl {:?})", key, ttl);
        }
    }

    /// 删除缓存项，键不存在时什么也不做
    pub async fn invalidate(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            tracing::warn!("Cache invalidation failed for {}: {}", key, e);
        } else {
            tracing::debug!("Invalidated cache: {}", key);
        }
    }
}
