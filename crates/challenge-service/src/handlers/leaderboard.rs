//! 排行榜处理器（公开）
//!
//! `current` 每次都从数据库重新计算，也是实时推送不可用时的轮询入口。

use axum::{
    Json,
    extract::{Path, State},
};

use crate::dto::ApiResponse;
use crate::error::Result;
use crate::models::{LeaderboardEntry, LeaderboardSnapshot};
use crate::service::parse_activity_date;
use crate::state::AppState;

/// GET /api/leaderboard/current
pub async fn current(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<LeaderboardEntry>>>> {
    let entries = state.leaderboard_service.current().await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// GET /api/leaderboard/history/{date}
pub async fn history(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<ApiResponse<Option<Vec<LeaderboardEntry>>>>> {
    let date = parse_activity_date(&date)?;
    let rankings = state.leaderboard_service.history(date).await?;
    Ok(Json(ApiResponse::success(rankings)))
}

/// GET /api/leaderboard/latest
pub async fn latest(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Option<LeaderboardSnapshot>>>> {
    let snapshot = state.leaderboard_service.latest().await?;
    Ok(Json(ApiResponse::success(snapshot)))
}
