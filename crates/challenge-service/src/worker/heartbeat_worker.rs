//! 实时连接心跳 Worker
//!
//! 按固定间隔执行一次扫描：上一周期没有回应的连接被断开，其余连接收到新的 Ping。

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::realtime::{ConnectionRegistry, SweepReport};

pub struct HeartbeatWorker {
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
}

impl HeartbeatWorker {
    pub fn new(registry: Arc<ConnectionRegistry>, interval_secs: u64) -> Self {
        Self {
            registry,
            interval: Duration::from_secs(interval_secs.max(1)),
        }
    }

    /// 默认 45 秒一次
    pub fn with_defaults(registry: Arc<ConnectionRegistry>) -> Self {
        Self::new(registry, 45)
    }

    /// 主循环：持续扫描直到进程退出
    pub async fn run(&self) {
        info!(interval = ?self.interval, "HeartbeatWorker 已启动");

        loop {
            tokio::time::sleep(self.interval).await;
            self.tick();
        }
    }

    /// 执行一次扫描
    pub fn tick(&self) -> SweepReport {
        self.registry.sweep()
    }
}
