use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes};
use challenge_shared::observability::metrics;
use dashmap::DashMap;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::message::{ClientMessage, ServerMessage};
use crate::models::LeaderboardEntry;

/// 未订阅时的用户 ID 占位
const NO_USER: i64 = 0;

/// 单个连接的登记信息
pub struct ClientHandle {
    tx: mpsc::Sender<Message>,
    alive: AtomicBool,
    /// 是否已入队过广播
    updated: AtomicBool,
    user_id: AtomicI64,
    terminate: Notify,
}

impl ClientHandle {
    /// 已订阅的用户 ID
    pub fn user_id(&self) -> Option<i64> {
        match self.user_id.load(Ordering::Relaxed) {
            NO_USER => None,
            id => Some(id),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed)
    }

    /// 等待心跳扫描将连接判定为失活
    pub async fn terminated(&self) {
        self.terminate.notified().await;
    }
}

/// 一次广播的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
}

/// 一次心跳扫描的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub active: usize,
    pub terminated: usize,
}

/// 连接注册表
pub struct ConnectionRegistry {
    clients: DashMap<Uuid, Arc<ClientHandle>>,
    buffer: usize,
}

impl ConnectionRegistry {
    /// `buffer` 为每个连接的发送队列长度
    pub fn new(buffer: usize) -> Self {
        Self {
            clients: DashMap::new(),
            buffer: buffer.max(1),
        }
    }

    /// 登记新连接，返回连接 ID、句柄和发送队列的接收端
    pub fn register(&self) -> (Uuid, Arc<ClientHandle>, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = Uuid::now_v7();
        let handle = Arc::new(ClientHandle {
            tx,
            alive: AtomicBool::new(true),
            updated: AtomicBool::new(false),
            user_id: AtomicI64::new(NO_USER),
            terminate: Notify::new(),
        });

        self.clients.insert(id, handle.clone());
        metrics::set_realtime_connections(self.clients.len());
        info!(connection_id = %id, total = self.clients.len(), "实时连接已建立");

        (id, handle, rx)
    }

    pub fn unregister(&self, id: Uuid) {
        if self.clients.remove(&id).is_some() {
            metrics::set_realtime_connections(self.clients.len());
            info!(connection_id = %id, total = self.clients.len(), "实时连接已断开");
        }
    }

    pub fn mark_alive(&self, id: Uuid) {
        if let Some(client) = self.clients.get(&id) {
            client.alive.store(true, Ordering::Relaxed);
        }
    }

    /// 处理客户端文本消息，无法解析的消息记录日志后忽略
    pub fn handle_client_text(&self, id: Uuid, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Subscribe { user_id }) => {
                if let Some(client) = self.clients.get(&id) {
                    client.user_id.store(user_id, Ordering::Relaxed);
                    debug!(connection_id = %id, user_id, "连接已关联用户");
                }
            }
            Ok(ClientMessage::Pong) => self.mark_alive(id),
            Err(e) => warn!(connection_id = %id, error = %e, "无法解析客户端消息"),
        }
    }

    /// 向单个连接推送连接建立时的初始排行榜
    ///
    /// 该连接已入队过广播时不再推送，避免较旧的数据排在广播之后。
    pub fn send_initial(&self, id: Uuid, entries: &[LeaderboardEntry]) -> bool {
        let Some(payload) = encode_update(entries) else {
            return false;
        };
        // 写锁与 broadcast 的遍历互斥，检查和入队之间不会插入广播
        let Some(client) = self.clients.get_mut(&id) else {
            return false;
        };
        if client.updated.load(Ordering::Relaxed) {
            debug!(connection_id = %id, "已收到广播，跳过初始推送");
            return false;
        }
        client.tx.try_send(Message::Text(payload)).is_ok()
    }

    /// 向所有连接广播排行榜
    ///
    /// 只序列化一次；队列满或已关闭的连接计为失败。
    pub fn broadcast(&self, entries: &[LeaderboardEntry]) -> BroadcastReport {
        let Some(payload) = encode_update(entries) else {
            return BroadcastReport::default();
        };

        let mut report = BroadcastReport::default();
        for client in self.clients.iter() {
            report.total += 1;
            match client.tx.try_send(Message::Text(payload.clone())) {
                Ok(()) => {
                    client.updated.store(true, Ordering::Relaxed);
                    report.sent += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    debug!(connection_id = %client.key(), error = %e, "排行榜推送入队失败");
                }
            }
        }

        metrics::record_leaderboard_broadcast(report.sent, report.failed);
        info!(
            sent = report.sent,
            failed = report.failed,
            total = report.total,
            "排行榜广播完成"
        );

        report
    }

    /// 心跳扫描
    ///
    /// 上一周期未标记存活的连接被终止并移除；其余连接重置标记并发送 Ping。
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        self.clients.retain(|id, client| {
            if client.alive.swap(false, Ordering::Relaxed) {
                report.active += 1;
                if client.tx.try_send(Message::Ping(Bytes::new())).is_err() {
                    debug!(connection_id = %id, "Ping 入队失败");
                }
                true
            } else {
                report.terminated += 1;
                client.terminate.notify_one();
                false
            }
        });

        metrics::set_realtime_connections(self.clients.len());
        info!(
            active = report.active,
            terminated = report.terminated,
            "心跳扫描完成"
        );

        report
    }

    pub fn connected_clients(&self) -> usize {
        self.clients.len()
    }
}

fn encode_update(entries: &[LeaderboardEntry]) -> Option<Utf8Bytes> {
    match serde_json::to_string(&ServerMessage::LeaderboardUpdate(entries)) {
        Ok(json) => Some(Utf8Bytes::from(json)),
        Err(e) => {
            warn!(error = %e, "排行榜序列化失败");
            None
        }
    }
}
