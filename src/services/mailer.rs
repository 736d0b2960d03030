use async_trait::async_trait;

use crate::error::AppResult;

/// 密码重置邮件投递
#[async_trait]
pub trait ResetMailer: Send + Sync {
    async fn send_reset(&self, email: &str, token: &str, expires_in: u64) -> AppResult<()>;
}

/// 只写日志的投递实现，没有接入邮件服务时使用
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl ResetMailer for LogMailer {
    async fn send_reset(&self, email: &str, _token: &str, expires_in: u64) -> AppResult<()> {
        tracing::info!(
            "Password reset requested for {} (link valid for {}s)",
            email,
            expires_in
        );
        Ok(())
    }
}
