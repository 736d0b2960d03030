// HTTP 处理函数，按资源分组
pub mod auth;
pub mod system;
pub mod task;

use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON 请求体提取器，解析失败统一返回 400 `{"error": ...}`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
