//! 应用状态定义

use std::sync::Arc;

use challenge_shared::config::AppConfig;
use challenge_shared::database::Database;

use crate::auth::{JwtConfig, JwtManager};
use crate::email::EmailSender;
use crate::notifier::OwnerNotifier;
use crate::realtime::ConnectionRegistry;
use crate::repository::{
    ActivityRepository, ActivityRepositoryTrait, AnnouncementRepository,
    AnnouncementRepositoryTrait, PreferenceRepository, PreferenceRepositoryTrait,
    SnapshotRepository, SnapshotRepositoryTrait, UserRepository, UserRepositoryTrait,
};
use crate::service::{
    ActivityService, AdminService, AnnouncementService, AuthService, LeaderboardService,
};

/// 仓储集合
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepositoryTrait>,
    pub activities: Arc<dyn ActivityRepositoryTrait>,
    pub snapshots: Arc<dyn SnapshotRepositoryTrait>,
    pub preferences: Arc<dyn PreferenceRepositoryTrait>,
    pub announcements: Arc<dyn AnnouncementRepositoryTrait>,
}

impl Repositories {
    /// 基于 PostgreSQL 的实现
    pub fn postgres(db: &Database) -> Self {
        let pool = db.pool().clone();
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            activities: Arc::new(ActivityRepository::new(pool.clone())),
            snapshots: Arc::new(SnapshotRepository::new(pool.clone())),
            preferences: Arc::new(PreferenceRepository::new(pool.clone())),
            announcements: Arc::new(AnnouncementRepository::new(pool)),
        }
    }
}

/// 会话 Cookie 与外链相关设置
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    /// 配置后用于邮件中的链接，否则从请求头推断
    pub public_base_url: Option<String>,
}

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub session: SessionSettings,
    pub realtime: Arc<ConnectionRegistry>,
    pub preference_repo: Arc<dyn PreferenceRepositoryTrait>,
    pub auth_service: Arc<AuthService>,
    pub activity_service: Arc<ActivityService>,
    pub leaderboard_service: Arc<LeaderboardService>,
    pub announcement_service: Arc<AnnouncementService>,
    pub admin_service: Arc<AdminService>,
}

impl AppState {
    /// 组装全部服务
    pub fn new(
        db: Database,
        config: &AppConfig,
        repos: Repositories,
        email: Arc<dyn EmailSender>,
        notifier: Arc<dyn OwnerNotifier>,
    ) -> Self {
        let jwt = JwtManager::new(JwtConfig::from(&config.auth));
        let realtime = Arc::new(ConnectionRegistry::new(config.realtime.client_buffer));
        let base_url = config
            .server
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", config.server.port));

        let leaderboard_service = Arc::new(LeaderboardService::new(
            repos.activities.clone(),
            repos.snapshots.clone(),
            repos.users.clone(),
            email.clone(),
            notifier.clone(),
            realtime.clone(),
            base_url,
        ));

        let auth_service = Arc::new(AuthService::new(
            repos.users.clone(),
            repos.preferences.clone(),
            email.clone(),
            jwt.clone(),
            leaderboard_service.clone(),
            config.auth.owner_email.clone(),
            config.auth.password_reset_ttl_seconds,
        ));

        let activity_service = Arc::new(ActivityService::new(
            repos.activities.clone(),
            leaderboard_service.clone(),
            notifier.clone(),
        ));

        let announcement_service = Arc::new(AnnouncementService::new(
            repos.announcements.clone(),
            email.clone(),
        ));

        let admin_service = Arc::new(AdminService::new(
            repos.users.clone(),
            email,
            notifier,
            realtime.clone(),
        ));

        Self {
            db,
            jwt,
            session: SessionSettings {
                cookie_name: config.auth.cookie_name.clone(),
                public_base_url: config.server.public_base_url.clone(),
            },
            realtime,
            preference_repo: repos.preferences,
            auth_service,
            activity_service,
            leaderboard_service,
            announcement_service,
            admin_service,
        }
    }
}
