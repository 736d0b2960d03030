use super::EntityCache;
use crate::cache::keys::{user_by_id_key, user_by_username_key};
use crate::cache::models::CachedUserRef;
use crate::models::User;
use crate::store::StoreResult;

/// 用户缓存操作
impl EntityCache {
    /// 按ID读取用户，先查缓存再查存储，未命中时回填
    pub async fn user_by_id(&self, user_id: &str) -> StoreResult<Option<User>> {
        self.lookup_user_by_id(user_id, true).await
    }

    /// 按用户名读取用户，未命中时不回填缓存（登录失败不能留下缓存）。
    /// 用户名缓存只保存ID映射，实体本身仍按ID读取
    pub async fn peek_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let name_key = user_by_username_key(username);
        if let Some(user_ref) = self.get::<CachedUserRef>(&name_key).await {
            if let Some(user) = self.lookup_user_by_id(&user_ref.user_id, false).await? {
                if user.username == username {
                    return Ok(Some(user));
                }
            }
            // 映射已失效
            self.invalidate(&name_key).await;
        }

        self.store().find_user_by_username(username).await
    }

    async fn lookup_user_by_id(&self, user_id: &str, fill: bool) -> StoreResult<Option<User>> {
        let key = user_by_id_key(user_id);
        if let Some(user) = self.get::<User>(&key).await {
            return Ok(Some(user));
        }

        let user = self.store().find_user_by_id(user_id).await?;
        if let (true, Some(u)) = (fill, user.as_ref()) {
            self.put(&key, u, self.entity_ttl()).await;
        }
        Ok(user)
    }

    /// 用户名是否被正向缓存。只用于唯一性检查的快速路径，未命中不代表用户名可用
    pub async fn username_is_cached(&self, username: &str) -> bool {
        self.get::<CachedUserRef>(&user_by_username_key(username))
            .await
            .is_some()
    }

    /// 缓存用户名映射
    pub async fn cache_username(&self, user: &User) {
        let user_ref = CachedUserRef {
            user_id: user.id.clone(),
        };
        self.put(&user_by_username_key(&user.username), &user_ref, self.entity_ttl())
            .await;
    }

    pub async fn cache_user(&self, user: &User) {
        self.cache_username(user).await;
        self.put(&user_by_id_key(&user.id), user, self.entity_ttl())
            .await;
    }

    /// 用户记录变更后调用
    pub async fn invalidate_user(&self, user_id: &str) {
        self.invalidate(&user_by_id_key(user_id)).await;
    }
}
