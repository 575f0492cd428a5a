//! 会话 Cookie
//!
//! Cookie 为 HttpOnly + SameSite=Lax，请求经由 HTTPS（直接或代理转发）时追加 Secure。

use axum::http::HeaderMap;
use axum_extra::headers::{Cookie, HeaderMapExt};

/// 判断请求是否经由 HTTPS 到达
pub fn is_secure_request(headers: &HeaderMap, scheme: Option<&str>) -> bool {
    if scheme == Some("https") {
        return true;
    }

    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').any(|proto| proto.trim().eq_ignore_ascii_case("https")))
        .unwrap_or(false)
}

/// 构造下发会话 Token 的 Set-Cookie 值
pub fn session_cookie(name: &str, token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// 构造清除会话的 Set-Cookie 值
pub fn clear_session_cookie(name: &str, secure: bool) -> String {
    session_cookie(name, "", 0, secure)
}

/// 从 Cookie 头中读取会话 Token
pub fn session_token_from_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(name).map(str::to_string))
        .filter(|value| !value.is_empty())
}
