//! 数据库仓储层
//!
//! 仓储只负责数据持久化，不包含业务逻辑；服务层依赖 trait 接口以便 mock 测试。

mod activity_repo;
mod announcement_repo;
mod preference_repo;
mod snapshot_repo;
mod traits;
mod user_repo;

pub use activity_repo::ActivityRepository;
pub use announcement_repo::AnnouncementRepository;
pub use preference_repo::PreferenceRepository;
pub use snapshot_repo::SnapshotRepository;
pub use traits::*;
pub use user_repo::UserRepository;
