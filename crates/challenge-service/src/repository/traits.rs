//! 仓储 Trait 定义

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::models::{
    Announcement, AnnouncementStatus, DailyActivity, DeliveryStats, DeliveryStatus, InboxItem,
    LeaderboardEntry, LeaderboardSnapshot, PendingDelivery, User, UserOverview, UserPreferences,
    UserRole, UserTotal,
};
use crate::scoring::ActivityCounts;

/// 新建用户参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// 邮件收件人
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Recipient {
    pub user_id: i64,
    pub email: String,
    pub name: Option<String>,
}

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_by_reset_token_hash(&self, token_hash: &str) -> Result<Option<User>>;
    async fn create(&self, user: &NewUser) -> Result<User>;
    async fn touch_last_signed_in(&self, id: i64) -> Result<()>;
    async fn set_reset_token(
        &self,
        id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;
    /// 更新密码并清除重置 Token
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()>;
    async fn update_name(&self, id: i64, name: &str) -> Result<()>;
    /// 全部用户及其活动统计，按总分降序
    async fn list_overview(&self) -> Result<Vec<UserOverview>>;
    /// 开启了排行榜通知的用户
    async fn list_leaderboard_recipients(&self) -> Result<Vec<Recipient>>;
}

/// 每日活动仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityRepositoryTrait: Send + Sync {
    /// 按 (用户, 日期) 插入或覆盖，返回记录以及是否为新建
    async fn upsert(
        &self,
        user_id: i64,
        date: NaiveDate,
        counts: ActivityCounts,
        total_points: i32,
        notes: Option<String>,
    ) -> Result<(DailyActivity, bool)>;
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<DailyActivity>>;
    async fn find_by_date(&self, user_id: i64, date: NaiveDate) -> Result<Option<DailyActivity>>;
    /// 返回是否删除了记录
    async fn delete(&self, user_id: i64, date: NaiveDate) -> Result<bool>;
    /// 有活动记录的用户及其累计积分
    async fn user_totals(&self) -> Result<Vec<UserTotal>>;
}

/// 排行榜快照仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// 同一日期重复发布时覆盖
    async fn upsert(
        &self,
        publish_date: NaiveDate,
        rankings: &[LeaderboardEntry],
        published_by: i64,
    ) -> Result<LeaderboardSnapshot>;
    async fn find_by_date(&self, publish_date: NaiveDate) -> Result<Option<LeaderboardSnapshot>>;
    async fn latest(&self) -> Result<Option<LeaderboardSnapshot>>;
}

/// 偏好仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceRepositoryTrait: Send + Sync {
    async fn find(&self, user_id: i64) -> Result<Option<UserPreferences>>;
    /// 创建默认偏好（已存在时不变）
    async fn create_default(&self, user_id: i64) -> Result<()>;
    /// 只覆盖提供了的字段
    async fn upsert(
        &self,
        user_id: i64,
        notify_on_leaderboard: Option<bool>,
        notify_on_announcements: Option<bool>,
    ) -> Result<UserPreferences>;
}

/// 公告仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnnouncementRepositoryTrait: Send + Sync {
    async fn create(&self, created_by: i64, title: &str, content: &str) -> Result<Announcement>;
    async fn list(&self) -> Result<Vec<Announcement>>;
    async fn find(&self, id: i64) -> Result<Option<Announcement>>;
    /// 为每个用户创建待投递记录并标记为已发送，返回 (公告, 投递数)
    async fn mark_sent(&self, id: i64) -> Result<(Announcement, u64)>;
    async fn set_status(&self, id: i64, status: AnnouncementStatus)
    -> Result<Option<Announcement>>;
    async fn delivery_stats(&self, id: i64) -> Result<DeliveryStats>;
    /// 认领一批待投递记录，租约期内其他轮次不会再取到同一条
    async fn claim_pending_deliveries(
        &self,
        limit: i64,
        lease_secs: i64,
    ) -> Result<Vec<PendingDelivery>>;
    /// 仅更新仍为 pending 的记录，返回是否写入
    async fn update_delivery_status(&self, delivery_id: i64, status: DeliveryStatus)
    -> Result<bool>;
    async fn inbox(&self, user_id: i64) -> Result<Vec<InboxItem>>;
    /// 返回是否存在对应的投递记录
    async fn mark_read(&self, user_id: i64, announcement_id: i64) -> Result<bool>;
}
