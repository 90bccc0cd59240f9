//! Collaborator interfaces the relay calls into: vendor profiles, presence
//! and chat persistence.
//!
//! All three are synchronous. Async callers go through
//! `tokio::task::spawn_blocking`, and never while holding the connection
//! registry lock.

pub mod memory;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::models::{ChatRecord, NewChatMessage, StoredMessage, VendorProfile};

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unknown vendor: {0}")]
    UnknownVendor(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Vendor profiles: display name and preferred language per identity.
pub trait VendorDirectory: Send + Sync {
    fn lookup_vendor(&self, vendor_id: &str) -> Result<Option<VendorProfile>, StoreError>;

    /// Insert or replace a profile. Presence is left untouched.
    fn save_vendor(&self, profile: &VendorProfile) -> Result<(), StoreError>;
}

/// Durable online/offline flag per vendor.
pub trait PresenceStore: Send + Sync {
    fn set_presence(
        &self,
        vendor_id: &str,
        online: bool,
        last_seen: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// Durable chat log.
pub trait MessageStore: Send + Sync {
    /// Append a message, returning its server-assigned id and timestamp.
    fn persist_chat_message(&self, message: &NewChatMessage) -> Result<StoredMessage, StoreError>;

    /// The newest `limit` messages, oldest first.
    fn recent_messages(&self, limit: usize) -> Result<Vec<ChatRecord>, StoreError>;
}
