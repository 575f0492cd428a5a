//! 公告服务
//!
//! 草稿 → 发送（为每个用户生成待投递记录）→ 归档。
//! 邮件投递由后台 Worker 调用 [`AnnouncementService::process_pending_deliveries`] 完成。

use std::sync::Arc;

use challenge_shared::observability::metrics;
use tracing::{debug, error, info, instrument, warn};

use crate::dto::SendAnnouncementResponse;
use crate::email::{EmailSender, templates};
use crate::error::{ApiError, Result};
use crate::models::{
    Announcement, AnnouncementStatus, DeliveryStats, DeliveryStatus, InboxItem, PendingDelivery,
};
use crate::repository::AnnouncementRepositoryTrait;

/// 认领租约：Worker 在回写前崩溃时，记录在此之后才会被重新认领
const CLAIM_LEASE_SECS: i64 = 600;

/// 一轮投递的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

pub struct AnnouncementService {
    repo: Arc<dyn AnnouncementRepositoryTrait>,
    email: Arc<dyn EmailSender>,
}

impl AnnouncementService {
    pub fn new(repo: Arc<dyn AnnouncementRepositoryTrait>, email: Arc<dyn EmailSender>) -> Self {
        Self { repo, email }
    }

    pub async fn create(&self, created_by: i64, title: &str, content: &str) -> Result<Announcement> {
        let announcement = self.repo.create(created_by, title.trim(), content).await?;
        info!(announcement_id = announcement.id, "公告草稿已创建");
        Ok(announcement)
    }

    /// 全部公告，最新的在前
    pub async fn list(&self) -> Result<Vec<Announcement>> {
        self.repo.list().await
    }

    async fn require(&self, id: i64) -> Result<Announcement> {
        self.repo
            .find(id)
            .await?
            .ok_or(ApiError::AnnouncementNotFound(id))
    }

    /// 发送草稿公告
    #[instrument(skip(self))]
    pub async fn send(&self, id: i64) -> Result<SendAnnouncementResponse> {
        let announcement = self.require(id).await?;
        if announcement.status != AnnouncementStatus::Draft {
            return Err(ApiError::AnnouncementNotDraft {
                id,
                status: announcement.status.as_str().to_string(),
            });
        }

        let (announcement, deliveries) = self.repo.mark_sent(id).await?;
        info!(announcement_id = id, deliveries, "公告已发送");

        Ok(SendAnnouncementResponse {
            announcement,
            deliveries,
        })
    }

    pub async fn archive(&self, id: i64) -> Result<Announcement> {
        let announcement = self
            .repo
            .set_status(id, AnnouncementStatus::Archived)
            .await?
            .ok_or(ApiError::AnnouncementNotFound(id))?;
        info!(announcement_id = id, "公告已归档");
        Ok(announcement)
    }

    pub async fn delivery_stats(&self, id: i64) -> Result<DeliveryStats> {
        self.require(id).await?;
        self.repo.delivery_stats(id).await
    }

    pub async fn inbox(&self, user_id: i64) -> Result<Vec<InboxItem>> {
        self.repo.inbox(user_id).await
    }

    pub async fn mark_read(&self, user_id: i64, announcement_id: i64) -> Result<()> {
        if !self.repo.mark_read(user_id, announcement_id).await? {
            return Err(ApiError::AnnouncementNotFound(announcement_id));
        }
        Ok(())
    }

    /// 处理一批待投递记录
    ///
    /// 开启公告通知的用户发送邮件，成功记为 delivered、失败记为 failed；
    /// 关闭通知的用户直接记为 delivered（站内收件箱仍可见）。
    /// 邮件发出后回写失败只记录日志；记录仍处于认领租约内，下一轮不会重复发送。
    pub async fn process_pending_deliveries(&self, batch_size: i64) -> Result<DeliveryReport> {
        let pending = self
            .repo
            .claim_pending_deliveries(batch_size, CLAIM_LEASE_SECS)
            .await?;
        let mut report = DeliveryReport::default();

        for delivery in pending {
            let status = self.deliver(&delivery).await;
            match self
                .repo
                .update_delivery_status(delivery.delivery_id, status)
                .await
            {
                Ok(true) => {}
                Ok(false) => debug!(
                    delivery_id = delivery.delivery_id,
                    "投递记录已不是 pending（用户已读），跳过回写"
                ),
                Err(e) => error!(
                    delivery_id = delivery.delivery_id,
                    status = status.as_str(),
                    error = %e,
                    "投递状态回写失败"
                ),
            }
            metrics::record_announcement_delivery(status.as_str());

            match status {
                DeliveryStatus::Failed => report.failed += 1,
                _ => report.delivered += 1,
            }
        }

        if report.delivered + report.failed > 0 {
            info!(
                delivered = report.delivered,
                failed = report.failed,
                "公告投递批次完成"
            );
        }

        Ok(report)
    }

    async fn deliver(&self, delivery: &PendingDelivery) -> DeliveryStatus {
        if !delivery.notify_on_announcements {
            return DeliveryStatus::Delivered;
        }

        let message = templates::announcement(
            &delivery.email,
            delivery.user_name.as_deref().unwrap_or("Participant"),
            &delivery.title,
            &delivery.content,
        );

        match self.email.send("announcement", message).await {
            Ok(()) => DeliveryStatus::Delivered,
            Err(e) => {
                warn!(
                    delivery_id = delivery.delivery_id,
                    user_id = delivery.user_id,
                    error = %e,
                    "公告邮件投递失败"
                );
                DeliveryStatus::Failed
            }
        }
    }
}
