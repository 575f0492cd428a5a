//! 管理员权限中间件

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::auth::{CurrentUser, UNAUTHENTICATED_MESSAGE};

const FORBIDDEN_MESSAGE: &str = "You do not have required permission (10002)";

/// 要求当前用户为管理员，须位于 `auth_middleware` 之后
pub async fn require_admin(request: Request<Body>, next: Next) -> Response {
    let (status, code, message) = match request.extensions().get::<CurrentUser>() {
        Some(CurrentUser(user)) if user.is_admin() => return next.run(request).await,
        Some(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", FORBIDDEN_MESSAGE),
        None => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", UNAUTHENTICATED_MESSAGE),
    };

    let body = json!({
        "success": false,
        "code": code,
        "message": message,
        "data": null
    });

    (status, axum::Json(body)).into_response()
}
