use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    middleware::{auth_middleware, observe_requests},
    routes,
};

// 公开路由：注册、登录、密码重置、健康检查
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/reset-password", post(routes::auth::request_password_reset))
        .route(
            "/auth/reset-password/confirm",
            post(routes::auth::confirm_password_reset),
        )
        .route("/health", get(routes::system::health))
}

// 需要会话令牌的路由
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route(
            "/task",
            get(routes::task::list_tasks).post(routes::task::create_task),
        )
        .route(
            "/task/{id}",
            get(routes::task::get_task)
                .put(routes::task::update_task)
                .delete(routes::task::delete_task),
        )
        .route("/metrics", get(routes::system::metrics))
        .route_layer(from_fn_with_state(state, auth_middleware))
}

/// 创建主路由
pub fn build_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .layer(from_fn_with_state(state.clone(), observe_requests))
        .layer(TraceLayer::new_for_http());

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    router.with_state(state)
}
