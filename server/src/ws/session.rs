//! Per-connection protocol state machine.
//!
//! A connection starts unregistered, becomes registered once it announces
//! a vendor identity, and ends closed. Only the connection's own task
//! drives these transitions.

use crate::chat::{pipeline, presence};
use crate::state::AppState;
use crate::ws::protocol::InboundFrame;
use crate::ws::ConnectionHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unregistered,
    Registered { vendor_id: String },
    Closed,
}

pub struct Session {
    state: SessionState,
    handle: ConnectionHandle,
}

impl Session {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            state: SessionState::Unregistered,
            handle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn vendor_id(&self) -> Option<&str> {
        match &self.state {
            SessionState::Registered { vendor_id } => Some(vendor_id.as_str()),
            _ => None,
        }
    }

    /// Process one inbound text frame. Unparseable, unknown or invalid
    /// frames are dropped without a reply and never close the connection.
    pub async fn handle_text(&mut self, app: &AppState, text: &str) {
        if self.state == SessionState::Closed {
            return;
        }

        let frame = match InboundFrame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(
                    connection = self.handle.id(),
                    error = %e,
                    "Ignoring malformed frame"
                );
                return;
            }
        };

        tracing::trace!(connection = self.handle.id(), kind = frame.kind(), "Inbound frame");

        match frame {
            InboundFrame::Register { vendor_id } => {
                let vendor_id = vendor_id.trim();
                if vendor_id.is_empty() {
                    tracing::debug!(connection = self.handle.id(), "Ignoring register without vendorId");
                    return;
                }
                self.register(app, vendor_id);
            }
            InboundFrame::Chat { text } => {
                let Some(sender) = self.vendor_id().map(str::to_string) else {
                    tracing::debug!(connection = self.handle.id(), "Ignoring chat before register");
                    return;
                };
                let Some(text) = pipeline::normalize_chat_text(&text) else {
                    tracing::debug!(vendor_id = %sender, "Ignoring empty or oversized chat");
                    return;
                };
                pipeline::relay_chat(app, &sender, text).await;
            }
            InboundFrame::Unknown => {
                tracing::debug!(connection = self.handle.id(), "Ignoring unknown frame type");
            }
        }
    }

    fn register(&mut self, app: &AppState, vendor_id: &str) {
        // Switching identity on a live connection gives up the old one first
        if let SessionState::Registered { vendor_id: previous } = &self.state {
            if previous != vendor_id {
                if let Some(at) = app.connections.release(previous, &self.handle) {
                    presence::mark_offline(app, previous, at);
                }
            }
        }

        let at = app.connections.register(vendor_id, self.handle.clone());
        presence::mark_online(app, vendor_id, at);

        tracing::info!(
            vendor_id = %vendor_id,
            connection = self.handle.id(),
            "Vendor registered"
        );
        self.state = SessionState::Registered {
            vendor_id: vendor_id.to_string(),
        };
    }

    /// Transport closed or failed. Gives up the registry entry if this
    /// connection still owns it. A connection that was superseded leaves
    /// both the entry and the presence flag to its replacement.
    pub fn close(&mut self, app: &AppState) {
        let previous = std::mem::replace(&mut self.state, SessionState::Closed);

        if let SessionState::Registered { vendor_id } = previous {
            if let Some(at) = app.connections.release(&vendor_id, &self.handle) {
                presence::mark_offline(app, &vendor_id, at);
                tracing::info!(vendor_id = %vendor_id, "Vendor disconnected");
            } else {
                tracing::debug!(vendor_id = %vendor_id, "Superseded connection closed");
            }
        }
    }
}
