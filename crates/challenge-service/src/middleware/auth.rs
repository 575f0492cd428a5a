//! 会话认证中间件
//!
//! 从 `Authorization: Bearer` 或会话 Cookie 中读取 Token，验证后加载用户并注入请求扩展。
//! 公开路由在未登录时放行；其余路由未登录返回 401。

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use crate::auth::session_token_from_cookie;
use crate::error::ApiError;
use crate::models::User;
use crate::state::AppState;

pub(crate) const UNAUTHENTICATED_MESSAGE: &str = "Please login (10001)";

/// 公开路由前缀
const PUBLIC_PATHS: &[&str] = &[
    "/api/auth/register",
    "/api/auth/login",
    "/api/auth/logout",
    "/api/auth/me",
    "/api/auth/password-reset",
    "/api/leaderboard",
    "/ws",
    "/health",
    "/ready",
];

fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| path.starts_with(p))
}

/// 当前登录用户
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers())
        .or_else(|| session_token_from_cookie(request.headers(), &state.session.cookie_name));

    if let Some(token) = token {
        match state.jwt.verify_token(&token).and_then(|c| c.user_id()) {
            Ok(user_id) => match state.auth_service.current_user(user_id).await {
                Ok(Some(user)) => {
                    request.extensions_mut().insert(CurrentUser(user));
                }
                Ok(None) => debug!(user_id, "会话对应的用户不存在"),
                Err(e) => return e.into_response(),
            },
            Err(e) => debug!(error = %e, "会话 Token 无效"),
        }
    }

    if request.extensions().get::<CurrentUser>().is_some() || is_public(request.uri().path()) {
        return next.run(request).await;
    }

    unauthorized_response(UNAUTHENTICATED_MESSAGE)
}

fn unauthorized_response(message: &str) -> Response {
    let body = json!({
        "success": false,
        "code": "UNAUTHORIZED",
        "message": message,
        "data": null
    });

    (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized(UNAUTHENTICATED_MESSAGE.to_string()))
    }
}

/// 可选的当前用户（公开路由使用）
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts.extensions.get::<CurrentUser>().map(|u| u.0.clone()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_public_paths() {
        assert!(is_public("/api/leaderboard/current"));
        assert!(is_public("/api/auth/password-reset/confirm"));
        assert!(is_public("/ws"));
        assert!(!is_public("/api/activities"));
        assert!(!is_public("/api/admin/users"));
        assert!(!is_public("/api/auth/display-name"));
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("abc.def"));

        headers.insert("Authorization", HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);
    }
}
