//! 公告投递 Worker
//!
//! 定期取出一批待投递记录，按用户偏好发送邮件并回写投递状态。

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::error::Result;
use crate::service::{AnnouncementService, DeliveryReport};

pub struct AnnouncementDeliveryWorker {
    service: Arc<AnnouncementService>,
    /// 轮询间隔
    poll_interval: Duration,
    /// 每批处理的最大记录数
    batch_size: i64,
}

impl AnnouncementDeliveryWorker {
    pub fn new(service: Arc<AnnouncementService>, poll_interval_secs: u64, batch_size: i64) -> Self {
        Self {
            service,
            poll_interval: Duration::from_secs(poll_interval_secs.max(1)),
            batch_size: batch_size.max(1),
        }
    }

    /// 默认每 30 秒处理最多 200 条
    pub fn with_defaults(service: Arc<AnnouncementService>) -> Self {
        Self::new(service, 30, 200)
    }

    /// 主循环：持续处理直到进程退出
    pub async fn run(&self) {
        info!(
            poll_interval = ?self.poll_interval,
            batch_size = self.batch_size,
            "AnnouncementDeliveryWorker 已启动"
        );

        loop {
            if let Err(e) = self.run_once().await {
                error!(error = %e, "公告投递出错");
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// 处理一批
    pub async fn run_once(&self) -> Result<DeliveryReport> {
        self.service.process_pending_deliveries(self.batch_size).await
    }
}
