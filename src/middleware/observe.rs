use std::time::Instant;

use axum::{
    body::{Body, to_bytes},
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tracing::{error, info};

use crate::{AppState, services::RequestContext};

/// 5xx 响应体最多读取的字节数
const ERROR_BODY_LIMIT: usize = 1024;

/// 记录每个请求的结构化日志，并把耗时和状态码写入请求指标
pub async fn observe_requests(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let elapsed = started.elapsed();
    let status = response.status();
    let user_id = response
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.user_id.clone());

    state
        .metrics
        .record(elapsed, status.as_u16(), user_id.clone());
    info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = elapsed.as_millis() as u64,
        user_id = user_id.as_deref().unwrap_or("-"),
        "request completed"
    );

    if !status.is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, ERROR_BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            error!("Failed to read error response body: {}", e);
            return Response::from_parts(parts, Body::empty());
        }
    };
    error!(
        "Server error occurred - {} {} - Status: {}, Body: {}",
        method,
        path,
        parts.status,
        String::from_utf8_lossy(&bytes)
    );

    // 重置body以便重新构建响应
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}
