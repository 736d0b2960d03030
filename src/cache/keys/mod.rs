/// 缓存键模块
/// 提供各种缓存键生成函数

// 用户缓存键模块
pub mod user_keys;

// 任务缓存键模块
pub mod task_keys;

// 令牌缓存键模块
pub mod token_keys;

pub use task_keys::{task_by_id_key, task_list_key};
pub use token_keys::{reset_key, session_key};
pub use user_keys::{user_by_id_key, user_by_username_key};
