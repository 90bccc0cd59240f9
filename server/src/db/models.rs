/// Record types shared by the store backends.
/// These correspond to the SQLite schema defined in migrations.rs.
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Vendor attributes the relay consults; the vendor record itself is
/// managed elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorProfile {
    pub vendor_id: String,
    pub name: String,
    pub preferred_language: Option<String>,
}

/// A chat message ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub vendor_id: String,
    pub text: String,
    pub detected_language: String,
    pub variants: BTreeMap<String, String>,
}

/// Server-assigned identity of a persisted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

/// A persisted chat message as served by the history endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub id: String,
    pub vendor_id: String,
    #[serde(rename = "message")]
    pub text: String,
    #[serde(rename = "originalLanguage")]
    pub detected_language: String,
    #[serde(rename = "translations")]
    pub variants: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

/// One presence write, as recorded by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceUpdate {
    pub vendor_id: String,
    pub online: bool,
    pub last_seen: DateTime<Utc>,
}
