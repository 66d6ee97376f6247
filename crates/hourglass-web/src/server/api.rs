//! REST API endpoints — activity intake and conversation state.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::error;

use hourglass_core::error::TurnError;
use hourglass_core::types::{ConversationKey, IncomingActivity};

use super::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/messages", post(post_activity))
        .route("/api/conversations/{id}", get(get_conversation))
}

fn error_status(e: &TurnError) -> StatusCode {
    match e {
        TurnError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        TurnError::ChannelSendFailure(_) => StatusCode::BAD_GATEWAY,
        TurnError::InvalidDelayRange { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// --- Activities ---

async fn post_activity(
    State(state): State<Arc<AppState>>,
    Json(activity): Json<IncomingActivity>,
) -> (StatusCode, Json<Value>) {
    let conversation = activity.conversation.clone();
    match state.bot.on_activity(activity).await {
        Ok(reply) => (StatusCode::OK, Json(json!({"ok": true, "reply": reply}))),
        Err(e) => {
            error!("[{}] turn failed: {}", conversation, e);
            (
                error_status(&e),
                Json(json!({"ok": false, "error": e.to_string()})),
            )
        }
    }
}

// --- Conversation state ---

async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let key = ConversationKey::new(id);
    let coordinator = state.bot.coordinator();

    let counter = match coordinator.counter(&key).await {
        Ok(c) => c,
        Err(e) => return (error_status(&e), Json(json!({"error": e.to_string()}))),
    };
    let signal = match coordinator.signal_flag(&key).read().await {
        Ok(f) => f,
        Err(e) => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": e.to_string()})),
            )
        }
    };

    (
        StatusCode::OK,
        Json(json!({
            "conversation": key,
            "turn_count": counter.turn_count,
            "signal": signal,
            "active_workers": coordinator.supervisor().active_workers(&key),
        })),
    )
}
