/// 任务缓存键前缀
const TASK_ID_PREFIX: &str = "task-by-id:";

/// 用户任务列表缓存键前缀
const TASK_LIST_PREFIX: &str = "task-list-by-owner:";

/// 生成任务缓存键
pub fn task_by_id_key(task_id: &str) -> String {
    format!("{}{}", TASK_ID_PREFIX, task_id)
}

/// 生成用户任务列表缓存键
pub fn task_list_key(owner_id: &str) -> String {
    format!("{}{}", TASK_LIST_PREFIX, owner_id)
}
