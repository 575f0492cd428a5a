use serde::{Deserialize, Serialize};

use crate::models::LeaderboardEntry;

/// 客户端发来的消息
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// 关联用户 ID
    Subscribe {
        #[serde(rename = "userId")]
        user_id: i64,
    },
    /// 应用层心跳回应
    Pong,
}

/// 服务端推送的消息
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage<'a> {
    LeaderboardUpdate(&'a [LeaderboardEntry]),
}
