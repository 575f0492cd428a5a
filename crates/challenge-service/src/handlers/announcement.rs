//! 公告处理器
//!
//! 管理端：创建、列表、发送、归档、投递统计；用户端：收件箱与已读。

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::dto::{ApiResponse, CreateAnnouncementRequest, SendAnnouncementResponse};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{Announcement, DeliveryStats, InboxItem};
use crate::state::AppState;

/// 创建公告草稿
///
/// POST /api/admin/announcements
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Json(req): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Announcement>>)> {
    req.validate()?;

    let announcement = state
        .announcement_service
        .create(admin.id, &req.title, &req.content)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(announcement))))
}

/// GET /api/admin/announcements
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Announcement>>>> {
    let announcements = state.announcement_service.list().await?;
    Ok(Json(ApiResponse::success(announcements)))
}

/// 发送草稿，为每个用户生成待投递记录
///
/// POST /api/admin/announcements/{id}/send
pub async fn send(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SendAnnouncementResponse>>> {
    let result = state.announcement_service.send(id).await?;
    Ok(Json(ApiResponse::success_with_message(
        result,
        "Announcement queued for delivery",
    )))
}

/// POST /api/admin/announcements/{id}/archive
pub async fn archive(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Announcement>>> {
    let announcement = state.announcement_service.archive(id).await?;
    Ok(Json(ApiResponse::success(announcement)))
}

/// GET /api/admin/announcements/{id}/stats
pub async fn delivery_stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<DeliveryStats>>> {
    let stats = state.announcement_service.delivery_stats(id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /api/announcements/inbox
pub async fn inbox(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<InboxItem>>>> {
    let items = state.announcement_service.inbox(user.id).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// POST /api/announcements/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    state.announcement_service.mark_read(user.id, id).await?;
    Ok(Json(ApiResponse::message("Marked as read")))
}
