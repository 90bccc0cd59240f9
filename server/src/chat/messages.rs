//! REST view of the chat log.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::db::models::ChatRecord;
use crate::state::AppState;

/// Default page size for message history.
const DEFAULT_LIMIT: usize = 50;
/// Maximum page size for message history.
const MAX_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// GET /api/chat/messages?limit={n}
/// Most recent messages in chronological order.
pub async fn get_chat_messages(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatRecord>>, StatusCode> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let store = state.messages.clone();

    let messages = tokio::task::spawn_blocking(move || store.recent_messages(limit))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .map_err(|e| {
            tracing::warn!(error = %e, "Failed to load chat history");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(messages))
}
