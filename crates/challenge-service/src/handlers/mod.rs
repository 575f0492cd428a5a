//! HTTP 请求处理器模块
//!
//! 处理器只负责解析请求、校验 DTO 并调用服务层。

pub mod activity;
pub mod admin;
pub mod announcement;
pub mod auth;
pub mod health;
pub mod leaderboard;
pub mod preference;

use axum::http::HeaderMap;

use crate::auth::is_secure_request;
use crate::state::AppState;

/// 邮件链接使用的站点地址
///
/// 优先使用配置的公开地址，其次是 Origin 头，最后由 Host 头推断。
pub(crate) fn request_origin(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.session.public_base_url {
        return base.trim_end_matches('/').to_string();
    }

    if let Some(origin) = headers.get("origin").and_then(|v| v.to_str().ok()) {
        return origin.trim_end_matches('/').to_string();
    }

    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = if is_secure_request(headers, None) {
        "https"
    } else {
        "http"
    };
    format!("{}://{}", scheme, host)
}
