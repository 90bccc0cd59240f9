//! Live connection handles keyed by vendor identity.
//!
//! One mutex guards the whole map. Broadcasts take a snapshot under the
//! lock and send after releasing it, so a slow or dead peer never holds up
//! registration or removal of other connections.

use axum::extract::ws::{CloseFrame, Message};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// The connection's writer task is gone; nothing more can be delivered.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("connection {0} is closed")]
pub struct ConnectionClosed(pub u64);

/// Capability to push frames to one WebSocket connection.
///
/// Cloning shares the same underlying connection. Frames go through the
/// connection's writer task, so sending never waits on the network.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: u64,
    tx: mpsc::UnboundedSender<Message>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            tx,
        }
    }

    /// Process-unique id of the underlying connection.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn send(&self, msg: Message) -> Result<(), ConnectionClosed> {
        self.tx.send(msg).map_err(|_| ConnectionClosed(self.id))
    }

    /// Ask the writer to send a Close frame and stop. Frames queued after
    /// this are never delivered.
    pub fn close(&self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code,
            reason: reason.into(),
        };
        let _ = self.tx.send(Message::Close(Some(frame)));
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn same_connection(&self, other: &ConnectionHandle) -> bool {
        self.id == other.id
    }
}

/// Shared map from vendor identity to its live connection.
///
/// At most one entry exists per identity. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    entries: Arc<Mutex<BTreeMap<String, ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // The map is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ConnectionHandle>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace the entry for `identity` and return the time of
    /// the change.
    ///
    /// The time is read under the lock, so stamps returned by `register` and
    /// `release` are ordered the same way the changes were applied. A
    /// replaced handle that belongs to a different connection is closed
    /// once the lock is released. Re-registering the same connection is a
    /// harmless self-replace.
    pub fn register(&self, identity: &str, handle: ConnectionHandle) -> DateTime<Utc> {
        let new_id = handle.id();
        let (previous, at) = {
            let mut entries = self.lock();
            (entries.insert(identity.to_string(), handle), Utc::now())
        };

        match previous {
            Some(prev) if prev.id() != new_id => {
                tracing::info!(
                    vendor_id = %identity,
                    superseded = prev.id(),
                    connection = new_id,
                    "Vendor re-registered from a new connection, closing the old one"
                );
                prev.close(super::CLOSE_SUPERSEDED, "Superseded by a newer connection");
            }
            _ => {
                tracing::debug!(vendor_id = %identity, connection = new_id, "Connection registered");
            }
        }
        at
    }

    /// Remove the entry for `identity` regardless of which connection owns it.
    pub fn unregister(&self, identity: &str) -> Option<ConnectionHandle> {
        let removed = self.lock().remove(identity);
        if removed.is_some() {
            tracing::debug!(vendor_id = %identity, "Connection unregistered");
        }
        removed
    }

    /// Remove the entry for `identity` only if it still belongs to
    /// `handle`'s connection. Returns the time of the removal, or `None` if
    /// nothing was removed.
    pub fn release(&self, identity: &str, handle: &ConnectionHandle) -> Option<DateTime<Utc>> {
        let removed_at = {
            let mut entries = self.lock();
            let owned = entries
                .get(identity)
                .is_some_and(|current| current.same_connection(handle));
            if owned {
                entries.remove(identity);
                Some(Utc::now())
            } else {
                None
            }
        };

        if removed_at.is_some() {
            tracing::debug!(vendor_id = %identity, connection = handle.id(), "Connection released");
        }
        removed_at
    }

    /// Point-in-time copy of all entries, ordered by identity.
    pub fn snapshot_all(&self) -> Vec<(String, ConnectionHandle)> {
        self.lock()
            .iter()
            .map(|(identity, handle)| (identity.clone(), handle.clone()))
            .collect()
    }

    pub fn lookup(&self, identity: &str) -> Option<ConnectionHandle> {
        self.lock().get(identity).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
