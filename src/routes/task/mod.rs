mod handler;

pub use handler::{create_task, delete_task, get_task, list_tasks, update_task};
