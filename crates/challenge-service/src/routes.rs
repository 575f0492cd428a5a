//! 路由配置模块
//!
//! 公开路由、登录用户路由和管理员路由分组构建，认证中间件覆盖全部 API。

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use challenge_shared::config::ServerConfig;
use challenge_shared::observability::middleware::{http_tracing, request_id};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::middleware::{auth_middleware, require_admin, security_headers};
use crate::realtime::ws_handler;
use crate::{handlers, state::AppState};

/// 账号路由（除修改显示名称外均为公开）
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
        .route(
            "/auth/password-reset/request",
            post(handlers::auth::request_password_reset),
        )
        .route(
            "/auth/password-reset/confirm",
            post(handlers::auth::confirm_password_reset),
        )
        .route(
            "/auth/display-name",
            put(handlers::auth::update_display_name),
        )
}

/// 公开的排行榜路由
fn leaderboard_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/leaderboard/current",
            get(handlers::leaderboard::current),
        )
        .route(
            "/leaderboard/history/{date}",
            get(handlers::leaderboard::history),
        )
        .route("/leaderboard/latest", get(handlers::leaderboard::latest))
}

/// 登录用户路由
fn participant_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/activities",
            post(handlers::activity::submit).get(handlers::activity::list_mine),
        )
        .route(
            "/activities/{date}",
            get(handlers::activity::get_by_date).delete(handlers::activity::delete),
        )
        .route(
            "/preferences",
            get(handlers::preference::get).put(handlers::preference::update),
        )
        .route(
            "/announcements/inbox",
            get(handlers::announcement::inbox),
        )
        .route(
            "/announcements/{id}/read",
            post(handlers::announcement::mark_read),
        )
}

/// 管理员路由，挂载在 `/api/admin` 下
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::admin::users))
        .route(
            "/leaderboard/publish",
            post(handlers::admin::publish_leaderboard),
        )
        .route("/email", post(handlers::admin::send_email))
        .route("/notify-owner", post(handlers::admin::notify_owner))
        .route("/realtime", get(handlers::admin::realtime_stats))
        // 公告
        .route(
            "/announcements",
            post(handlers::announcement::create).get(handlers::announcement::list),
        )
        .route(
            "/announcements/{id}/send",
            post(handlers::announcement::send),
        )
        .route(
            "/announcements/{id}/stats",
            get(handlers::announcement::delivery_stats),
        )
        .route(
            "/announcements/{id}/archive",
            post(handlers::announcement::archive),
        )
        .layer(middleware::from_fn(require_admin))
}

/// 全部 `/api` 路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(leaderboard_routes())
        .merge(participant_routes())
        .nest("/admin", admin_routes())
}

/// 根据配置构建 CORS 层，`*` 表示允许任意来源
pub fn cors_layer(origins: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.trim() == "*" {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| o.parse().ok())
        .collect();

    // 携带会话 Cookie 需要显式来源
    base.allow_origin(allowed).allow_credentials(true)
}

/// 组装完整应用
pub fn build_app(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws", get(ws_handler))
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(&server.cors_origins))
        .layer(middleware::from_fn(http_tracing))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_construction() {
        let _auth = auth_routes();
        let _leaderboard = leaderboard_routes();
        let _participant = participant_routes();
        let _admin = admin_routes();
        let _api = api_routes();
    }

    #[test]
    fn test_cors_layer_accepts_wildcard_and_lists() {
        let _any = cors_layer("*");
        let _list = cors_layer("http://localhost:3000, https://challenge.example.com");
        let _empty = cors_layer("");
    }
}
