use axum::{extract::State, routing::get, Json, Router};

use crate::chat::{messages, presence};
use crate::state::AppState;
use crate::vendors;
use crate::ws::handler as ws_handler;

/// GET /health: liveness probe with the current connection count.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "connections": state.connections.len(),
    }))
}

/// Build the full axum Router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler::ws_upgrade))
        .route("/api/chat/messages", get(messages::get_chat_messages))
        .route("/api/presence", get(presence::get_presence))
        .route(
            "/api/vendors/{vendor_id}",
            get(vendors::get_vendor).put(vendors::put_vendor),
        )
        .route("/health", get(health))
        .with_state(state)
}
