// 认证模块
// 密码哈希、JWT 签发校验、会话与重置令牌管理

pub mod claims;
pub mod credentials;
pub mod session;

pub use claims::{Claims, JwtKeys, TokenKind, token_digest};
pub use credentials::CredentialStore;
pub use session::{IssuedToken, SessionManager};
