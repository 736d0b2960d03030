pub mod task;
pub mod user;

pub use task::{CreateTask, NewTask, Task, TaskPatch, TaskStatus, parse_expire_date};
pub use user::{NewUser, User, UserView};
