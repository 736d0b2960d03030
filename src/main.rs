use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use task_manager::{
    AppState,
    cache::{CacheStore, MemoryCache, RedisCache},
    config::Config,
    router::build_router,
    services::LogMailer,
    store::{DocumentStore, MemoryStore, PgStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env()?;

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    // 文档存储：没有配置数据库时使用内存实现
    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url, config.store_timeout()).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory document store");
            Arc::new(MemoryStore::new())
        }
    };

    // 缓存：Redis 连接是惰性建立的，启动时不可用也不影响服务
    let cache: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => {
            let redis = RedisCache::new(url, config.cache_timeout())?;
            if let Err(e) = redis.ping().await {
                tracing::warn!("Redis not reachable at startup: {}", e);
            }
            Arc::new(redis)
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory cache");
            Arc::new(MemoryCache::new())
        }
    };

    let state = AppState::new(config, cache, store, Arc::new(LogMailer));
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    let app = build_router(state);

    // 启动服务器
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
