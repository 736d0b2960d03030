use serde::{Deserialize, Serialize};

/// 令牌缓存数据模型。只保存令牌摘要，不保存令牌原文
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CachedToken {
    pub token_digest: String,
    pub user_id: String,
    pub expires_at: i64, // Unix timestamp
}
