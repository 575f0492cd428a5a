use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::ActivityCounts;

/// 某用户某一天的活动记录
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "date")]
    pub activity_date: NaiveDate,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub counts: ActivityCounts,
    pub total_points: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
