use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户通知偏好
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub id: i64,
    pub user_id: i64,
    pub notify_on_leaderboard: bool,
    pub notify_on_announcements: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
