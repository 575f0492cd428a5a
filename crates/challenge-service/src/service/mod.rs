//! 业务服务层
//!
//! 服务依赖仓储 trait 对象，便于在单元测试中替换为 mock。

mod activity_service;
mod admin_service;
mod announcement_service;
mod auth_service;
mod leaderboard_service;

pub use activity_service::{ActivityService, parse_activity_date};
pub use admin_service::AdminService;
pub use announcement_service::{AnnouncementService, DeliveryReport};
pub use auth_service::{AuthService, LoginOutcome, RESET_REQUEST_MESSAGE};
pub use leaderboard_service::LeaderboardService;
