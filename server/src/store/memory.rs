//! In-process store backend.
//!
//! Holds vendors in a DashMap and the chat log in a Vec. Every presence
//! write is also appended to a log so callers can observe what the relay
//! reported.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Mutex;

use super::{MessageStore, PresenceStore, StoreError, VendorDirectory};
use crate::db::models::{ChatRecord, NewChatMessage, PresenceUpdate, StoredMessage, VendorProfile};

#[derive(Debug, Clone)]
struct VendorState {
    profile: VendorProfile,
    online: bool,
    last_seen: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryStore {
    vendors: DashMap<String, VendorState>,
    messages: Mutex<Vec<ChatRecord>>,
    presence_log: Mutex<Vec<PresenceUpdate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a vendor profile. Presence is left untouched.
    pub fn upsert_vendor(&self, profile: VendorProfile) {
        self.vendors
            .entry(profile.vendor_id.clone())
            .and_modify(|state| state.profile = profile.clone())
            .or_insert_with(|| VendorState {
                profile,
                online: false,
                last_seen: None,
            });
    }

    /// Current presence flag, `None` for unknown vendors.
    pub fn is_online(&self, vendor_id: &str) -> Option<bool> {
        self.vendors.get(vendor_id).map(|state| state.online)
    }

    /// Every presence write received so far, in arrival order.
    pub fn presence_updates(&self) -> Vec<PresenceUpdate> {
        self.presence_log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }
}

impl VendorDirectory for MemoryStore {
    fn lookup_vendor(&self, vendor_id: &str) -> Result<Option<VendorProfile>, StoreError> {
        Ok(self
            .vendors
            .get(vendor_id)
            .map(|state| state.profile.clone()))
    }

    fn save_vendor(&self, profile: &VendorProfile) -> Result<(), StoreError> {
        self.upsert_vendor(profile.clone());
        Ok(())
    }
}

impl PresenceStore for MemoryStore {
    fn set_presence(
        &self,
        vendor_id: &str,
        online: bool,
        last_seen: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.presence_log
            .lock()
            .map_err(|_| StoreError::Unavailable("presence log lock poisoned".to_string()))?
            .push(PresenceUpdate {
                vendor_id: vendor_id.to_string(),
                online,
                last_seen,
            });

        let mut state = self
            .vendors
            .get_mut(vendor_id)
            .ok_or_else(|| StoreError::UnknownVendor(vendor_id.to_string()))?;

        // Never let a late write move presence backwards in time
        if state.last_seen.map_or(true, |seen| seen <= last_seen) {
            state.online = online;
            state.last_seen = Some(last_seen);
        }
        Ok(())
    }
}

impl MessageStore for MemoryStore {
    fn persist_chat_message(&self, message: &NewChatMessage) -> Result<StoredMessage, StoreError> {
        let stored = StoredMessage {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
        };

        self.messages
            .lock()
            .map_err(|_| StoreError::Unavailable("message log lock poisoned".to_string()))?
            .push(ChatRecord {
                id: stored.id.clone(),
                vendor_id: message.vendor_id.clone(),
                text: message.text.clone(),
                detected_language: message.detected_language.clone(),
                variants: message.variants.clone(),
                timestamp: stored.timestamp,
            });

        Ok(stored)
    }

    fn recent_messages(&self, limit: usize) -> Result<Vec<ChatRecord>, StoreError> {
        let messages = self
            .messages
            .lock()
            .map_err(|_| StoreError::Unavailable("message log lock poisoned".to_string()))?;
        let skip = messages.len().saturating_sub(limit);
        Ok(messages[skip..].to_vec())
    }
}
