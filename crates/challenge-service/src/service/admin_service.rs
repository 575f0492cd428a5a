//! 管理端服务

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::dto::RealtimeStats;
use crate::email::{EmailSender, templates};
use crate::error::{ApiError, Result};
use crate::models::UserOverview;
use crate::notifier::OwnerNotifier;
use crate::realtime::ConnectionRegistry;
use crate::repository::UserRepositoryTrait;

pub struct AdminService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    email: Arc<dyn EmailSender>,
    notifier: Arc<dyn OwnerNotifier>,
    registry: Arc<ConnectionRegistry>,
}

impl AdminService {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryTrait>,
        email: Arc<dyn EmailSender>,
        notifier: Arc<dyn OwnerNotifier>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            user_repo,
            email,
            notifier,
            registry,
        }
    }

    /// 全部用户及活动统计，按总分降序
    pub async fn users_overview(&self) -> Result<Vec<UserOverview>> {
        self.user_repo.list_overview().await
    }

    /// 给单个用户发送邮件
    #[instrument(skip(self, message))]
    pub async fn send_email(&self, user_id: i64, subject: &str, message: &str) -> Result<()> {
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| !u.email.is_empty())
            .ok_or_else(|| ApiError::NotFound("User not found or email not available".to_string()))?;

        let email = templates::admin_message(&user.email, user.display_name(), subject, message);
        self.email.send("admin_message", email).await.map_err(|e| {
            warn!(user_id, error = %e, "管理员邮件发送失败");
            ApiError::EmailDelivery("Failed to send email".to_string())
        })?;

        info!(user_id, "管理员邮件已发送");
        self.notifier
            .notify(
                "Email Sent to Participant",
                &format!("Subject \"{}\" sent to {} ({})", subject, user.display_name(), user.email),
            )
            .await;

        Ok(())
    }

    /// 转发通知给所有者，返回是否送达
    pub async fn notify_owner(&self, title: &str, content: &str) -> bool {
        self.notifier.notify(title, content).await
    }

    pub fn realtime_stats(&self) -> RealtimeStats {
        RealtimeStats {
            connected_clients: self.registry.connected_clients(),
        }
    }
}
