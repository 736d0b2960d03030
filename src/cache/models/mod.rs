/// 缓存数据模型
/// 实体本身直接以 serde 快照缓存，这里只定义额外的缓存结构
pub mod token;
pub mod user;

pub use token::CachedToken;
pub use user::CachedUserRef;
