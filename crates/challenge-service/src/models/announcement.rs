use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 公告状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum AnnouncementStatus {
    /// 草稿，只有草稿可以发送
    #[default]
    Draft,
    Sent,
    Archived,
}

impl AnnouncementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Archived => "archived",
        }
    }
}

/// 投递状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Delivered,
    Read,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }
}

/// 公告
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub id: i64,
    pub created_by: i64,
    pub title: String,
    pub content: String,
    pub status: AnnouncementStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 投递统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStats {
    pub total: i64,
    pub pending: i64,
    pub delivered: i64,
    pub read: i64,
    pub failed: i64,
}

/// 待投递记录（联表带出收件人和公告内容）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingDelivery {
    pub delivery_id: i64,
    pub announcement_id: i64,
    pub user_id: i64,
    pub email: String,
    pub user_name: Option<String>,
    pub title: String,
    pub content: String,
    /// 没有偏好记录时视为开启
    pub notify_on_announcements: bool,
}

/// 用户收件箱条目
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InboxItem {
    pub announcement_id: i64,
    pub title: String,
    pub content: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub delivery_status: DeliveryStatus,
    pub read_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_json_is_lowercase() {
        assert_eq!(serde_json::to_value(AnnouncementStatus::Draft).unwrap(), "draft");
        assert_eq!(serde_json::to_value(DeliveryStatus::Read).unwrap(), "read");
        assert_eq!(AnnouncementStatus::Archived.as_str(), "archived");
        assert_eq!(DeliveryStatus::Failed.as_str(), "failed");
    }
}
