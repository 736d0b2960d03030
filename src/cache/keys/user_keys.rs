/// 用户ID缓存键前缀
const USER_ID_PREFIX: &str = "user-by-id:";

/// 用户名缓存键前缀
const USER_NAME_PREFIX: &str = "user-by-username:";

/// 生成用户ID缓存键
pub fn user_by_id_key(user_id: &str) -> String {
    format!("{}{}", USER_ID_PREFIX, user_id)
}

/// 生成用户名缓存键
pub fn user_by_username_key(username: &str) -> String {
    format!("{}{}", USER_NAME_PREFIX, username)
}
