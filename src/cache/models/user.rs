use serde::{Deserialize, Serialize};

/// 用户名到用户ID的映射缓存
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedUserRef {
    pub user_id: String,
}
