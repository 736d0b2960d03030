/// 会话令牌缓存键前缀，每个用户只保留一个有效会话
const SESSION_PREFIX: &str = "session:";

/// 密码重置令牌缓存键前缀
const RESET_PREFIX: &str = "reset:";

pub fn session_key(user_id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, user_id)
}

pub fn reset_key(user_id: &str) -> String {
    format!("{}{}", RESET_PREFIX, user_id)
}
