//! WebSocket — stream outgoing activities to connected clients.

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocket, Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::{error, info};

use hourglass_core::types::ConversationKey;

use super::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/{conversation_id}", get(ws_handler))
        .route("/ws", get(ws_all))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(conversation_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let key = ConversationKey::new(conversation_id);
    ws.on_upgrade(move |socket| handle_socket(socket, Some(key), state))
}

async fn ws_all(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, None, state))
}

async fn handle_socket(mut socket: WebSocket, filter: Option<ConversationKey>, state: Arc<AppState>) {
    let mut rx = state.channel.subscribe();
    let label = filter
        .as_ref()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "*".to_string());

    info!("WebSocket client connected to {}", label);

    loop {
        tokio::select! {
            // Outgoing activities -> client
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if filter.as_ref().is_some_and(|k| *k != event.conversation) {
                            continue;
                        }
                        match serde_json::to_string(&event.to_ws_json()) {
                            Ok(json) => {
                                if socket.send(axum::extract::ws::Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("Failed to serialize event: {}", e);
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        info!("WebSocket lagged {} events", n);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
            // Incoming messages from client (keep-alive)
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }

    info!("WebSocket client disconnected from {}", label);
}
