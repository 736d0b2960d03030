use bcrypt::{hash, verify};

use crate::error::AppError;

/// 密码哈希与校验（bcrypt，每次哈希使用随机盐）
#[derive(Debug, Clone, Copy)]
pub struct CredentialStore {
    cost: u32,
}

impl CredentialStore {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash(password.as_bytes(), self.cost)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    /// 哈希格式错误时返回 false，不报错
    pub fn verify_password(&self, credential: &str, password: &str) -> bool {
        verify(password.as_bytes(), credential).unwrap_or_else(|e| {
            tracing::warn!("Stored credential could not be verified: {}", e);
            false
        })
    }
}
