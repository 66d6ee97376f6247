//! Web server — Axum router + shared state.

pub mod api;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use hourglass_core::bot::Bot;
use hourglass_core::channel::BroadcastChannel;

/// Shared application state — the bot plus the channel it replies through.
pub struct AppState {
    pub bot: Bot,
    pub channel: Arc<BroadcastChannel>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(api::routes())
        .merge(ws::routes())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
