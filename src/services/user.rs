use std::sync::Arc;

use chrono::Utc;

use super::{RequestContext, ResetMailer};
use crate::auth::{CredentialStore, IssuedToken, SessionManager};
use crate::cache::EntityCache;
use crate::error::{AppError, AppResult, AuthError};
use crate::models::{NewUser, User};
use crate::store::StoreError;

/// 用户服务：注册、登录、登出、密码重置
#[derive(Clone)]
pub struct UserService {
    entities: EntityCache,
    credentials: CredentialStore,
    sessions: SessionManager,
    mailer: Arc<dyn ResetMailer>,
}

impl UserService {
    pub fn new(
        entities: EntityCache,
        credentials: CredentialStore,
        sessions: SessionManager,
        mailer: Arc<dyn ResetMailer>,
    ) -> Self {
        Self {
            entities,
            credentials,
            sessions,
            mailer,
        }
    }

    pub async fn register(&self, username: &str, password: &str, email: &str) -> AppResult<User> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err(AppError::Validation(
                "Username, password and email are required.".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("Email address is invalid.".to_string()));
        }

        // 正向缓存命中即可判定冲突；未命中必须再查存储
        if self.entities.username_is_cached(username).await {
            return Err(username_taken());
        }
        let store = self.entities.store();
        if store.find_user_by_username(username).await?.is_some() {
            return Err(username_taken());
        }
        if store.find_user_by_email(email).await?.is_some() {
            return Err(email_taken());
        }

        let password_hash = self.hash_password(password.to_string()).await?;
        let user = store
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // 并发注册绕过了预检查，由唯一索引兜底
                StoreError::Duplicate("email") => email_taken(),
                StoreError::Duplicate(_) => username_taken(),
                other => AppError::from(other),
            })?;

        self.entities.cache_user(&user).await;
        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<IssuedToken> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required.".to_string(),
            ));
        }

        // 登录失败不能留下任何缓存
        let user = self
            .entities
            .peek_user_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self
            .verify_password(user.password_hash.clone(), password.to_string())
            .await?
        {
            tracing::info!("Failed login attempt for {}", user.username);
            return Err(AuthError::InvalidCredentials.into());
        }

        self.entities
            .store()
            .update_last_login(&user.id, Utc::now())
            .await?;
        // last_login 已变化，下次读取必须回源
        self.entities.invalidate_user(&user.id).await;
        self.entities.cache_username(&user).await;

        let issued = self.sessions.issue(&user.id).await?;
        tracing::info!("User {} logged in", user.username);
        Ok(issued)
    }

    pub async fn logout(&self, ctx: &RequestContext) -> AppResult<()> {
        self.sessions.revoke(&ctx.user_id).await
    }

    pub async fn request_password_reset(&self, email: &str) -> AppResult<IssuedToken> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::Validation("Email is required.".to_string()));
        }

        let user = self
            .entities
            .store()
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound("Email not found".to_string()))?;

        let issued = self.sessions.issue_reset(&user.id).await?;
        if let Err(e) = self
            .mailer
            .send_reset(&user.email, &issued.token, issued.expires_in)
            .await
        {
            tracing::warn!("Failed to deliver reset link to {}: {}", user.email, e);
        }
        Ok(issued)
    }

    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> AppResult<()> {
        if token.is_empty() {
            return Err(AuthError::MissingToken.into());
        }
        if new_password.is_empty() {
            return Err(AppError::Validation("New password is required.".to_string()));
        }

        // 先消费令牌再写密码，同一个令牌只能换一次密码
        let user_id = self.sessions.consume_reset(token).await?;
        let password_hash = self.hash_password(new_password.to_string()).await?;
        self.entities
            .store()
            .update_password(&user_id, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::NotFound => AppError::from(AuthError::UnknownUser),
                other => AppError::from(other),
            })?;

        self.entities.invalidate_user(&user_id).await;
        // 密码变更后旧会话作废
        self.sessions.revoke(&user_id).await?;
        tracing::info!("Password reset completed for user {}", user_id);
        Ok(())
    }

    async fn hash_password(&self, password: String) -> AppResult<String> {
        let credentials = self.credentials;
        tokio::task::spawn_blocking(move || credentials.hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, credential: String, password: String) -> AppResult<bool> {
        let credentials = self.credentials;
        tokio::task::spawn_blocking(move || credentials.verify_password(&credential, &password))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
    }
}

fn username_taken() -> AppError {
    AppError::Duplicate("Username already taken".to_string())
}

fn email_taken() -> AppError {
    AppError::Duplicate("Email already registered".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::keys::{session_key, user_by_id_key, user_by_username_key};
    use crate::cache::{CacheStore, MemoryCache};
    use crate::config::Config;
    use crate::services::LogMailer;
    use crate::store::{DocumentStore, MemoryStore, UserStore};

    struct Fixture {
        users: UserService,
        sessions: SessionManager,
        cache: Arc<MemoryCache>,
        store: Arc<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let config = Config::new("test-secret");
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn DocumentStore> = store.clone();
        let entities = EntityCache::new(cache.clone(), dyn_store, &config);
        let sessions = SessionManager::new(&config, cache.clone(), entities.clone());
        let users = UserService::new(
            entities,
            CredentialStore::new(4),
            sessions.clone(),
            Arc::new(LogMailer),
        );
        Fixture {
            users,
            sessions,
            cache,
            store,
        }
    }

    fn duplicate_message(result: AppResult<User>) -> String {
        match result {
            Err(AppError::Duplicate(msg)) => msg,
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn register_rejects_username_and_email_collisions() {
        let f = fixture();
        let alice = f.users.register("alice", "pw123", "a@x.com").await.unwrap();
        assert_ne!(alice.password_hash, "pw123");

        assert_eq!(
            duplicate_message(f.users.register("alice", "pw", "other@x.com").await),
            "Username already taken"
        );
        assert_eq!(
            duplicate_message(f.users.register("bob", "pw", "a@x.com").await),
            "Email already registered"
        );
    }

    #[tokio::test]
    async fn uniqueness_check_survives_cold_cache() {
        let f = fixture();
        f.users.register("alice", "pw123", "a@x.com").await.unwrap();
        f.cache.delete(&user_by_username_key("alice")).await.unwrap();

        assert_eq!(
            duplicate_message(f.users.register("alice", "pw", "b@x.com").await),
            "Username already taken"
        );
    }

    #[tokio::test]
    async fn register_requires_all_fields() {
        let f = fixture();
        assert!(matches!(
            f.users.register("", "pw", "a@x.com").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            f.users.register("alice", "", "a@x.com").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            f.users.register("alice", "pw", "").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn login_updates_last_login_and_issues_session() {
        let f = fixture();
        let alice = f.users.register("alice", "pw123", "a@x.com").await.unwrap();
        assert!(alice.last_login.is_none());

        let issued = f.users.authenticate("alice", "pw123").await.unwrap();
        assert!(!f.cache.contains_key(&user_by_id_key(&alice.id)));
        assert!(f.cache.contains_key(&session_key(&alice.id)));

        let stored = f.store.find_user_by_id(&alice.id).await.unwrap().unwrap();
        assert!(stored.last_login.is_some());
        assert_eq!(f.sessions.validate(&issued.token).await.unwrap(), alice.id);
    }

    #[tokio::test]
    async fn wrong_password_leaves_no_trace() {
        let f = fixture();
        let alice = f.users.register("alice", "pw123", "a@x.com").await.unwrap();
        f.cache.delete(&user_by_id_key(&alice.id)).await.unwrap();
        f.cache.delete(&user_by_username_key("alice")).await.unwrap();

        match f.users.authenticate("alice", "nope").await {
            Err(AppError::Auth(AuthError::InvalidCredentials)) => {}
            other => panic!("expected invalid credentials, got {:?}", other),
        }
        assert!(f.cache.is_empty());
        assert!(!f.cache.contains_key(&session_key(&alice.id)));

        match f.users.authenticate("nobody", "pw123").await {
            Err(AppError::Auth(AuthError::InvalidCredentials)) => {}
            other => panic!("expected invalid credentials, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn password_reset_flow() {
        let f = fixture();
        let alice = f.users.register("alice", "pw123", "a@x.com").await.unwrap();
        let session = f.users.authenticate("alice", "pw123").await.unwrap();

        let reset = f.users.request_password_reset("a@x.com").await.unwrap();
        f.users
            .confirm_password_reset(&reset.token, "new_pass123")
            .await
            .unwrap();

        assert!(f.users.authenticate("alice", "pw123").await.is_err());
        f.users.authenticate("alice", "new_pass123").await.unwrap();
        assert!(f.sessions.validate(&session.token).await.is_err());
        assert!(!f.cache.contains_key(&user_by_id_key(&alice.id)));

        // 重置令牌只能用一次
        assert!(matches!(
            f.users.confirm_password_reset(&reset.token, "again").await,
            Err(AppError::Auth(AuthError::RevokedToken))
        ));
    }

    #[tokio::test]
    async fn reset_for_unknown_email_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.users.request_password_reset("ghost@x.com").await,
            Err(AppError::NotFound(_))
        ));
    }
}
