use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::{
    AppState,
    error::{AppError, AuthError},
    services::RequestContext,
};

/// 校验 `Authorization: Bearer <token>`，通过后把 RequestContext 放进请求扩展
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|rejection| {
        if rejection.is_missing() {
            AuthError::MissingToken
        } else {
            AuthError::MalformedToken
        }
    })?;

    let user_id = state.sessions.validate(bearer.token()).await?;
    tracing::debug!("Authenticated request for user {}", user_id);

    let ctx = RequestContext::new(user_id);
    req.extensions_mut().insert(ctx.clone());

    let mut response = next.run(req).await;
    // 供外层的请求观测中间件读取
    response.extensions_mut().insert(ctx);
    Ok(response)
}
