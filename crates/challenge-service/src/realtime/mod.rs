//! 实时排行榜推送
//!
//! 每个 WebSocket 连接登记在 [`ConnectionRegistry`] 中，持有一个有界发送队列和存活标记。
//! 广播只做非阻塞入队，慢连接队列满时记为失败，不会拖住其他连接。
//! 心跳扫描（见 `worker::HeartbeatWorker`）清理上一周期内没有回应的连接。

mod message;
mod registry;
mod socket;

pub use message::{ClientMessage, ServerMessage};
pub use registry::{BroadcastReport, ClientHandle, ConnectionRegistry, SweepReport};
pub use socket::ws_handler;
