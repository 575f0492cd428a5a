//! 账号相关的 HTTP 处理器
//!
//! 注册、登录、登出、当前用户、密码重置与显示名称

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, Uri, header::SET_COOKIE},
    response::IntoResponse,
};
use validator::Validate;

use super::request_origin;
use crate::auth::{clear_session_cookie, is_secure_request, session_cookie};
use crate::dto::{
    ApiResponse, LoginRequest, LoginResponse, PasswordResetConfirmRequest, PasswordResetRequest,
    RegisterRequest, UpdateDisplayNameRequest,
};
use crate::error::Result;
use crate::middleware::{CurrentUser, MaybeUser};
use crate::models::PublicUser;
use crate::service::RESET_REQUEST_MESSAGE;
use crate::state::AppState;

/// 注册
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<PublicUser>>> {
    req.validate()?;

    let origin = request_origin(&state, &headers);
    let user = state
        .auth_service
        .register(&req.email, &req.name, &req.password, &origin)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        user,
        "Registration successful",
    )))
}

/// 登录，Token 同时写入响应体和会话 Cookie
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    req.validate()?;

    let outcome = state.auth_service.login(&req.email, &req.password).await?;

    let cookie = session_cookie(
        &state.session.cookie_name,
        &outcome.token,
        state.jwt.expires_in_secs(),
        is_secure_request(&headers, uri.scheme_str()),
    );

    let body = LoginResponse {
        token: outcome.token,
        expires_at: outcome.expires_at,
        user: outcome.user,
    };

    Ok(([(SET_COOKIE, cookie)], Json(ApiResponse::success(body))))
}

/// 登出
///
/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
) -> impl IntoResponse {
    let cookie = clear_session_cookie(
        &state.session.cookie_name,
        is_secure_request(&headers, uri.scheme_str()),
    );

    ([(SET_COOKIE, cookie)], Json(ApiResponse::message("Logged out")))
}

/// 当前用户，未登录时 data 为 null
///
/// GET /api/auth/me
pub async fn me(MaybeUser(user): MaybeUser) -> Json<ApiResponse<Option<PublicUser>>> {
    Json(ApiResponse::success(user.map(PublicUser::from)))
}

/// POST /api/auth/password-reset/request
pub async fn request_password_reset(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Json<ApiResponse<()>>> {
    req.validate()?;

    let origin = request_origin(&state, &headers);
    state
        .auth_service
        .request_password_reset(&req.email, &origin)
        .await?;

    Ok(Json(ApiResponse::message(RESET_REQUEST_MESSAGE)))
}

/// POST /api/auth/password-reset/confirm
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetConfirmRequest>,
) -> Result<Json<ApiResponse<()>>> {
    req.validate()?;

    state
        .auth_service
        .reset_password(&req.token, &req.password)
        .await?;

    Ok(Json(ApiResponse::message("Password has been reset successfully")))
}

/// PUT /api/auth/display-name
pub async fn update_display_name(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateDisplayNameRequest>,
) -> Result<Json<ApiResponse<()>>> {
    req.validate()?;

    state
        .auth_service
        .update_display_name(user.id, &req.name)
        .await?;

    Ok(Json(ApiResponse::message("Display name updated")))
}
