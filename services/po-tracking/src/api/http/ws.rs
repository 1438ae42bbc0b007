//! 实时更新 WebSocket

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::api::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let updates = state.notifier.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, updates))
}

async fn handle_socket(socket: WebSocket, mut updates: broadcast::Receiver<String>) {
    info!("WebSocket client connected");
    let (mut sender, mut receiver) = socket.split();

    // 广播消息推送到客户端
    let mut send_task = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(msg) => {
                    if let Err(e) = sender.send(Message::Text(msg.into())).await {
                        warn!(error = %e, "Failed to send message to websocket");
                        break;
                    }
                }
                // 丢失的消息不补发
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client lagging behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    // 客户端消息只用于检测断开
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                other => debug!(?other, "Ignoring client message"),
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!("WebSocket disconnected");
}
