//! Vendor presence side effects and the presence REST view.
//!
//! Presence writes are fire-and-forget: they run on the blocking pool,
//! failures are logged there, and callers never wait for them. Each write
//! carries the time of the registry change behind it so the store can
//! discard stale ones.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

/// Record `vendor_id` as online as of `at`.
pub fn mark_online(state: &AppState, vendor_id: &str, at: DateTime<Utc>) {
    spawn_presence_update(state, vendor_id, true, at);
}

/// Record `vendor_id` as offline as of `at`.
pub fn mark_offline(state: &AppState, vendor_id: &str, at: DateTime<Utc>) {
    spawn_presence_update(state, vendor_id, false, at);
}

fn spawn_presence_update(state: &AppState, vendor_id: &str, online: bool, last_seen: DateTime<Utc>) {
    let store = state.presence.clone();
    let vendor_id = vendor_id.to_string();

    tokio::task::spawn_blocking(move || match store.set_presence(&vendor_id, online, last_seen) {
        Ok(()) => {
            tracing::debug!(vendor_id = %vendor_id, online, "Presence updated");
        }
        Err(e) => {
            tracing::warn!(
                vendor_id = %vendor_id,
                online,
                error = %e,
                "Failed to update vendor presence"
            );
        }
    });
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceResponse {
    pub vendor_id: String,
    pub online: bool,
}

/// GET /api/presence lists vendors currently connected to this relay.
pub async fn get_presence(State(state): State<AppState>) -> Json<Vec<PresenceResponse>> {
    let entries = state
        .connections
        .snapshot_all()
        .into_iter()
        .map(|(vendor_id, _)| PresenceResponse {
            vendor_id,
            online: true,
        })
        .collect();

    Json(entries)
}
