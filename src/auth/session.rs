use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use super::claims::{JwtKeys, TokenKind, token_digest};
use crate::cache::keys::{reset_key, session_key};
use crate::cache::models::CachedToken;
use crate::cache::{CacheStore, EntityCache, TokenCacheOperations};
use crate::config::Config;
use crate::error::{AppError, AppResult, AuthError};

/// 签发给客户端的令牌
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
}

/// 会话管理。
///
/// 每个用户在缓存中只有一个有效会话：`session:<user_id>` 保存当前令牌的摘要，
/// 新登录会覆盖旧令牌。JWT 签名本身无法撤销，缓存检查是唯一的撤销手段。
#[derive(Clone)]
pub struct SessionManager {
    keys: JwtKeys,
    tokens: TokenCacheOperations,
    entities: EntityCache,
    session_ttl: Duration,
    reset_ttl: Duration,
}

impl SessionManager {
    pub fn new(config: &Config, cache: Arc<dyn CacheStore>, entities: EntityCache) -> Self {
        Self {
            keys: JwtKeys::new(&config.jwt_secret),
            tokens: TokenCacheOperations::new(cache),
            entities,
            session_ttl: config.session_token_ttl(),
            reset_ttl: config.reset_token_ttl(),
        }
    }

    /// 签发会话令牌，并以相同的 TTL 记录到缓存
    pub async fn issue(&self, user_id: &str) -> AppResult<IssuedToken> {
        let issued = self
            .store_token(user_id, TokenKind::Session, &session_key(user_id), self.session_ttl)
            .await?;
        tracing::info!("Issued session token for user {}", user_id);
        Ok(issued)
    }

    /// 校验会话令牌，返回令牌所属的用户ID
    pub async fn validate(&self, token: &str) -> AppResult<String> {
        let claims = self.keys.verify_token(token)?;
        if claims.kind != TokenKind::Session {
            return Err(AuthError::MalformedToken.into());
        }

        self.ensure_current(&session_key(&claims.user_id), token)
            .await?;

        match self.entities.user_by_id(&claims.user_id).await? {
            Some(_) => Ok(claims.user_id),
            None => {
                tracing::warn!("Session token references missing user {}", claims.user_id);
                Err(AuthError::UnknownUser.into())
            }
        }
    }

    /// 撤销用户当前的会话，用户没有会话时什么也不做
    pub async fn revoke(&self, user_id: &str) -> AppResult<()> {
        self.tokens.remove_token(&session_key(user_id)).await?;
        tracing::info!("Revoked session for user {}", user_id);
        Ok(())
    }

    /// 签发密码重置令牌（与会话令牌分开存放）
    pub async fn issue_reset(&self, user_id: &str) -> AppResult<IssuedToken> {
        let issued = self
            .store_token(user_id, TokenKind::Reset, &reset_key(user_id), self.reset_ttl)
            .await?;
        tracing::info!("Issued password reset token for user {}", user_id);
        Ok(issued)
    }

    /// 校验并消费重置令牌，返回用户ID。
    ///
    /// 缓存记录通过原子的读取并删除取出，同一个令牌并发提交时只有一次成功。
    pub async fn consume_reset(&self, token: &str) -> AppResult<String> {
        let claims = self.keys.verify_token(token)?;
        if claims.kind != TokenKind::Reset {
            return Err(AuthError::MalformedToken.into());
        }

        let key = reset_key(&claims.user_id);
        let cached = self.tokens.take_token(&key).await.map_err(|e| {
            tracing::error!("Token store unavailable while consuming {}: {}", key, e);
            AppError::from(e)
        })?;
        match cached {
            Some(cached) if cached.token_digest == token_digest(token) => Ok(claims.user_id),
            Some(newer) => {
                // 取出的是之后签发的令牌，放回去
                self.restore_token(&key, &newer).await;
                Err(AuthError::RevokedToken.into())
            }
            None => Err(AuthError::RevokedToken.into()),
        }
    }

    async fn restore_token(&self, key: &str, cached: &CachedToken) {
        let remaining = cached.expires_at - Utc::now().timestamp();
        if remaining <= 0 {
            return;
        }
        if let Err(e) = self
            .tokens
            .cache_token(key, cached, Duration::from_secs(remaining as u64))
            .await
        {
            tracing::warn!("Failed to restore token under {}: {}", key, e);
        }
    }

    async fn store_token(
        &self,
        user_id: &str,
        kind: TokenKind,
        key: &str,
        ttl: Duration,
    ) -> AppResult<IssuedToken> {
        let (token, claims) = self.keys.generate_token(user_id, kind, ttl)?;
        let cached = CachedToken {
            token_digest: token_digest(&token),
            user_id: user_id.to_string(),
            expires_at: claims.exp,
        };
        self.tokens.cache_token(key, &cached, ttl).await?;

        Ok(IssuedToken {
            token,
            expires_in: ttl.as_secs(),
        })
    }

    /// 缓存中没有记录或记录的是另一个令牌时视为已撤销
    async fn ensure_current(&self, key: &str, token: &str) -> AppResult<()> {
        match self.tokens.get_cached_token(key).await {
            Ok(Some(cached)) if cached.token_digest == token_digest(token) => Ok(()),
            Ok(_) => Err(AuthError::RevokedToken.into()),
            Err(e) => {
                tracing::error!("Token store unavailable while checking {}: {}", key, e);
                Err(AppError::from(e))
            }
        }
    }
}
