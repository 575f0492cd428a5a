//! 每日活动处理器

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::dto::{ApiResponse, SubmitActivityRequest, SubmitActivityResponse};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::DailyActivity;
use crate::state::AppState;

/// 提交（或覆盖）某一天的活动
///
/// POST /api/activities
pub async fn submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SubmitActivityRequest>,
) -> Result<Json<ApiResponse<SubmitActivityResponse>>> {
    req.validate()?;

    let result = state
        .activity_service
        .submit_daily(&user, &req.date, req.counts, req.notes)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// GET /api/activities
pub async fn list_mine(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<DailyActivity>>>> {
    let activities = state.activity_service.list_mine(user.id).await?;
    Ok(Json(ApiResponse::success(activities)))
}

/// 指定日期的记录，不存在时 data 为 null
///
/// GET /api/activities/{date}
pub async fn get_by_date(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(date): Path<String>,
) -> Result<Json<ApiResponse<Option<DailyActivity>>>> {
    let activity = state.activity_service.get_by_date(user.id, &date).await?;
    Ok(Json(ApiResponse::success(activity)))
}

/// DELETE /api/activities/{date}
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(date): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state.activity_service.delete(user.id, &date).await?;
    Ok(Json(ApiResponse::message("Activity deleted")))
}
