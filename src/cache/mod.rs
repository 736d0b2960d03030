// 缓存模块
// 包含缓存存储接口、Redis / 内存实现、缓存键、缓存数据结构和读穿透操作

pub mod keys;
pub mod memory_store;
pub mod models;
pub mod operations;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

pub use memory_store::MemoryCache;
pub use operations::{CacheStats, EntityCache, TokenCacheOperations};
pub use redis_store::RedisCache;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache timed out after {0:?}")]
    Timeout(Duration),
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache serialization error: {0}")]
    Serialization(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// 带过期时间的键值存储
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;
    /// 写入并设置过期时间（原子操作）
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;
    /// 删除不存在的键不算错误
    async fn delete(&self, key: &str) -> CacheResult<()>;
    /// 读取并删除（原子操作），用于一次性令牌
    async fn take(&self, key: &str) -> CacheResult<Option<String>>;
    async fn ping(&self) -> CacheResult<()>;
}
