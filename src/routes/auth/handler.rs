use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
};

use super::model::{
    ConfirmResetRequest, LoginRequest, MessageResponse, RegisterRequest, RegisterResponse,
    ResetPasswordRequest, ResetPasswordResponse,
};
use crate::{
    AppState,
    auth::IssuedToken,
    error::AppResult,
    models::UserView,
    routes::ApiJson,
    services::RequestContext,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state
        .users
        .register(&req.username, &req.password, &req.email)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user: UserView::from(&user),
        }),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<Json<IssuedToken>> {
    let issued = state.users.authenticate(&req.username, &req.password).await?;
    Ok(Json(issued))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> AppResult<Json<MessageResponse>> {
    state.users.logout(&ctx).await?;
    Ok(Json(MessageResponse {
        message: "Successfully logged out",
    }))
}

#[axum::debug_handler]
pub async fn request_password_reset(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> AppResult<Json<ResetPasswordResponse>> {
    let issued = state.users.request_password_reset(&req.email).await?;
    Ok(Json(ResetPasswordResponse {
        message: "Password reset link sent",
        token: issued.token,
        expires_in: issued.expires_in,
    }))
}

#[axum::debug_handler]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ConfirmResetRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .users
        .confirm_password_reset(&req.token, &req.new_password)
        .await?;
    Ok(Json(MessageResponse {
        message: "Password has been reset",
    }))
}
