//! 通知偏好处理器

use axum::{Json, extract::State};
use tracing::info;

use crate::dto::{ApiResponse, UpdatePreferencesRequest};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::UserPreferences;
use crate::state::AppState;

/// 当前偏好，从未保存过时 data 为 null
///
/// GET /api/preferences
pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Option<UserPreferences>>>> {
    let prefs = state.preference_repo.find(user.id).await?;
    Ok(Json(ApiResponse::success(prefs)))
}

/// PUT /api/preferences
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdatePreferencesRequest>,
) -> Result<Json<ApiResponse<UserPreferences>>> {
    let prefs = state
        .preference_repo
        .upsert(
            user.id,
            req.notify_on_leaderboard,
            req.notify_on_announcements,
        )
        .await?;

    info!(
        user_id = user.id,
        leaderboard = prefs.notify_on_leaderboard,
        announcements = prefs.notify_on_announcements,
        "通知偏好已更新"
    );

    Ok(Json(ApiResponse::success(prefs)))
}
