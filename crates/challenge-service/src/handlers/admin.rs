//! 管理员处理器
//!
//! 路由层已经通过 `require_admin` 校验角色。

use axum::{Json, extract::State};
use validator::Validate;

use crate::dto::{
    ApiResponse, NotifyOwnerRequest, NotifyOwnerResponse, PublishLeaderboardRequest,
    RealtimeStats, SendEmailRequest,
};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{LeaderboardEntry, UserOverview};
use crate::service::parse_activity_date;
use crate::state::AppState;

/// 全部用户及其活动汇总
///
/// GET /api/admin/users
pub async fn users(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<UserOverview>>>> {
    let users = state.admin_service.users_overview().await?;
    Ok(Json(ApiResponse::success(users)))
}

/// 发布排行榜快照
///
/// POST /api/admin/leaderboard/publish
pub async fn publish_leaderboard(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Json(req): Json<PublishLeaderboardRequest>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>> {
    let date = parse_activity_date(&req.date)?;
    let entries = state.leaderboard_service.publish(date, admin.id).await?;
    Ok(Json(ApiResponse::success_with_message(
        entries,
        "Leaderboard published",
    )))
}

/// POST /api/admin/email
pub async fn send_email(
    State(state): State<AppState>,
    Json(req): Json<SendEmailRequest>,
) -> Result<Json<ApiResponse<()>>> {
    req.validate()?;

    state
        .admin_service
        .send_email(req.user_id, &req.subject, &req.message)
        .await?;

    Ok(Json(ApiResponse::message("Email sent")))
}

/// POST /api/admin/notify-owner
pub async fn notify_owner(
    State(state): State<AppState>,
    Json(req): Json<NotifyOwnerRequest>,
) -> Result<Json<ApiResponse<NotifyOwnerResponse>>> {
    req.validate()?;

    let delivered = state
        .admin_service
        .notify_owner(&req.title, &req.content)
        .await;

    Ok(Json(ApiResponse::success(NotifyOwnerResponse { delivered })))
}

/// GET /api/admin/realtime
pub async fn realtime_stats(State(state): State<AppState>) -> Json<ApiResponse<RealtimeStats>> {
    Json(ApiResponse::success(state.admin_service.realtime_stats()))
}
