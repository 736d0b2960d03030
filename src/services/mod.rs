// 业务服务
// 用户注册/登录/重置密码，任务增删改查

pub mod mailer;
pub mod task;
pub mod user;

pub use mailer::{LogMailer, ResetMailer};
pub use task::TaskService;
pub use user::UserService;

/// 当前请求的身份，由认证中间件生成并显式传给服务
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user_id: String,
}

impl RequestContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}
