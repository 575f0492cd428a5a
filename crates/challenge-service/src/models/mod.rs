//! 领域模型
//!
//! 数据库行结构（sqlx `FromRow`）与其 JSON 表示

mod activity;
mod announcement;
mod leaderboard;
mod preference;
mod user;

pub use activity::DailyActivity;
pub use announcement::{
    Announcement, AnnouncementStatus, DeliveryStats, DeliveryStatus, InboxItem, PendingDelivery,
};
pub use leaderboard::{LeaderboardEntry, LeaderboardSnapshot, TOP_FIVE, UserTotal, rank_standings};
pub use preference::UserPreferences;
pub use user::{PublicUser, User, UserOverview, UserRole};
