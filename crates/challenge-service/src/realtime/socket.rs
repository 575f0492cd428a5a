use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::state::AppState;

/// GET /ws
///
/// 升级为 WebSocket，建立后先推送一次当前排行榜
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let registry = state.realtime.clone();
    let (id, handle, mut rx) = registry.register();

    // 先登记再加载，加载期间的广播不会丢失
    match state.leaderboard_service.current().await {
        Ok(entries) => {
            registry.send_initial(id, &entries);
        }
        Err(e) => warn!(connection_id = %id, error = %e, "初始排行榜加载失败"),
    }

    let (mut sink, mut stream) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let recv_registry = registry.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => recv_registry.handle_client_text(id, text.as_str()),
                Message::Pong(_) => recv_registry.mark_alive(id),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
        _ = handle.terminated() => {
            debug!(connection_id = %id, "心跳超时，关闭连接");
            send_task.abort();
            recv_task.abort();
        }
    }

    registry.unregister(id);
}
