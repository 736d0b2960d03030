mod handler;
mod model;

pub use handler::{confirm_password_reset, login, logout, register, request_password_reset};
