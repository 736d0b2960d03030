use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client as RedisClient};
use tokio::sync::Mutex;

use super::{CacheError, CacheResult, CacheStore};

/// Redis 缓存存储，复用同一个多路复用连接，断开后下次调用时重连
pub struct RedisCache {
    client: RedisClient,
    conn: Mutex<Option<MultiplexedConnection>>,
    timeout: Duration,
}

impl RedisCache {
    pub fn new(redis_url: &str, timeout: Duration) -> CacheResult<Self> {
        let client = RedisClient::open(redis_url).map_err(backend_error)?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
            timeout,
        })
    }

    async fn connection(&self) -> CacheResult<MultiplexedConnection> {
        let mut slot = self.conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(backend_error)?;
        tracing::info!("Connected to redis");
        *slot = Some(conn.clone());
        Ok(conn)
    }

    /// 连接出错时丢弃旧连接
    async fn reset_on_error<T>(&self, result: CacheResult<T>) -> CacheResult<T> {
        if matches!(result, Err(CacheError::Backend(_))) {
            self.conn.lock().await.take();
        }
        result
    }

    async fn bounded<T, F>(&self, fut: F) -> CacheResult<T>
    where
        F: Future<Output = CacheResult<T>>,
    {
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        };
        self.reset_on_error(result).await
    }
}

fn backend_error(err: redis::RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            conn.get(key).await.map_err(backend_error)
        })
        .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        // SETEX 不接受 0 秒
        let seconds = ttl.as_secs().max(1);
        self.bounded(async {
            let mut conn = self.connection().await?;
            let _: () = conn.set_ex(key, value, seconds).await.map_err(backend_error)?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let _: () = conn.del(key).await.map_err(backend_error)?;
            Ok(())
        })
        .await
    }

    async fn take(&self, key: &str) -> CacheResult<Option<String>> {
        // GETDEL 需要 Redis 6.2 以上
        self.bounded(async {
            let mut conn = self.connection().await?;
            conn.get_del(key).await.map_err(backend_error)
        })
        .await
    }

    async fn ping(&self) -> CacheResult<()> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let _: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .map_err(backend_error)?;
            Ok(())
        })
        .await
    }
}
