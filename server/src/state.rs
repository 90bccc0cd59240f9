use std::sync::Arc;
use std::time::Duration;

use crate::i18n::Localizer;
use crate::store::{MessageStore, PresenceStore, VendorDirectory};
use crate::ws::ConnectionRegistry;

/// WebSocket keepalive timing.
#[derive(Debug, Clone, Copy)]
pub struct Keepalive {
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
}

impl Default for Keepalive {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
        }
    }
}

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Live vendor connections
    pub connections: ConnectionRegistry,
    /// Vendor profiles (display name, preferred language)
    pub vendors: Arc<dyn VendorDirectory>,
    /// Online/offline flag per vendor
    pub presence: Arc<dyn PresenceStore>,
    /// Chat log
    pub messages: Arc<dyn MessageStore>,
    /// Detection and translation over the supported languages
    pub localizer: Localizer,
    pub keepalive: Keepalive,
}

impl AppState {
    /// State backed by a single store implementing every collaborator trait.
    pub fn with_store<S>(store: Arc<S>, localizer: Localizer) -> Self
    where
        S: VendorDirectory + PresenceStore + MessageStore + 'static,
    {
        Self {
            connections: ConnectionRegistry::new(),
            vendors: store.clone(),
            presence: store.clone(),
            messages: store,
            localizer,
            keepalive: Keepalive::default(),
        }
    }

    pub fn with_keepalive(mut self, keepalive: Keepalive) -> Self {
        self.keepalive = keepalive;
        self
    }
}
