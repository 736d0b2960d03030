use std::sync::Arc;
use std::time::Duration;

use crate::cache::models::CachedToken;
use crate::cache::{CacheError, CacheResult, CacheStore};

/// 令牌缓存操作。
///
/// 与实体缓存不同，这里的错误会向上返回：令牌是否存在决定认证结果。
#[derive(Clone)]
pub struct TokenCacheOperations {
    cache: Arc<dyn CacheStore>,
}

impl TokenCacheOperations {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// 缓存令牌，过期时间与令牌一致
    pub async fn cache_token(&self, key: &str, token: &CachedToken, ttl: Duration) -> CacheResult<()> {
        let json =
            serde_json::to_string(token).map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.cache.set_ex(key, &json, ttl).await
    }

    /// 获取令牌缓存
    pub async fn get_cached_token(&self, key: &str) -> CacheResult<Option<CachedToken>> {
        match self.cache.get(key).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| CacheError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// 取出并删除令牌缓存，并发调用时只有一个能拿到
    pub async fn take_token(&self, key: &str) -> CacheResult<Option<CachedToken>> {
        match self.cache.take(key).await? {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| CacheError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// 删除令牌缓存
    pub async fn remove_token(&self, key: &str) -> CacheResult<()> {
        self.cache.delete(key).await
    }
}
