use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for environment variable {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub session_token_ttl_secs: u64,
    pub reset_token_ttl_secs: u64,
    pub entity_cache_ttl_secs: u64,
    pub list_cache_ttl_secs: u64,
    pub cache_timeout_ms: u64,
    pub store_timeout_ms: u64,
    pub bcrypt_cost: u32,
    pub require_future_expiration: bool,
    pub metrics_sample_capacity: usize,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    /// 使用默认值构建配置，只需要提供签名密钥
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: None,
            redis_url: None,
            jwt_secret: jwt_secret.into(),
            session_token_ttl_secs: 300,
            reset_token_ttl_secs: 3600,
            entity_cache_ttl_secs: 300,
            list_cache_ttl_secs: 60,
            cache_timeout_ms: 250,
            store_timeout_ms: 5000,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            require_future_expiration: true,
            metrics_sample_capacity: 100,
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "JWT_SECRET",
                value: jwt_secret,
            });
        }

        let defaults = Self::new(jwt_secret);
        Ok(Config {
            database_url: optional_var("DATABASE_URL"),
            redis_url: optional_var("REDIS_URL"),
            session_token_ttl_secs: parse_var("SESSION_TOKEN_TTL", defaults.session_token_ttl_secs)?,
            reset_token_ttl_secs: parse_var("RESET_TOKEN_TTL", defaults.reset_token_ttl_secs)?,
            entity_cache_ttl_secs: parse_var("ENTITY_CACHE_TTL", defaults.entity_cache_ttl_secs)?,
            list_cache_ttl_secs: parse_var("LIST_CACHE_TTL", defaults.list_cache_ttl_secs)?,
            cache_timeout_ms: parse_var("CACHE_TIMEOUT_MS", defaults.cache_timeout_ms)?,
            store_timeout_ms: parse_var("STORE_TIMEOUT_MS", defaults.store_timeout_ms)?,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            require_future_expiration: parse_var(
                "REQUIRE_FUTURE_EXPIRATION",
                defaults.require_future_expiration,
            )?,
            metrics_sample_capacity: parse_var(
                "METRICS_SAMPLE_CAPACITY",
                defaults.metrics_sample_capacity,
            )?,
            server_host: optional_var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            jwt_secret: defaults.jwt_secret,
        })
    }

    pub fn session_token_ttl(&self) -> Duration {
        Duration::from_secs(self.session_token_ttl_secs)
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_token_ttl_secs)
    }

    pub fn entity_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.entity_cache_ttl_secs)
    }

    pub fn list_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.list_cache_ttl_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match optional_var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
