// src/relay/broadcast.rs

//! `/ws`: every trade and signal update is pushed to all connected clients.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::relay::state::AppState;

pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!("New client connected: {}", session_id);

    let mut updates = state.updates.subscribe();
    let (mut sender, mut receiver) = socket.split();

    // Clients only listen; reading keeps ping/pong and close handling alive.
    let mut receive_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
            }
        }
    });

    let send_session = session_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    let Ok(json) = serde_json::to_string(&update) else { continue };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("WebSocket {} lagged by {} messages", send_session, n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        _ = &mut receive_task => {
            debug!("Receive task ended for session: {}", session_id);
            send_task.abort();
        }
        _ = &mut send_task => {
            debug!("Send task ended for session: {}", session_id);
            receive_task.abort();
        }
    }

    info!("Client disconnected: {}", session_id);
}
