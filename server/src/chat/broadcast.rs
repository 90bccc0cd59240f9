//! Per-recipient fan-out of relayed chat messages.

use std::collections::HashMap;

use crate::chat::ChatMessage;
use crate::db::models::VendorProfile;
use crate::i18n::LanguageSet;
use crate::state::AppState;
use crate::ws::protocol::{ChatFrame, OutboundFrame};
use crate::ws::ConnectionHandle;

/// A registry entry paired with what the relay knows about its vendor.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub vendor_id: String,
    pub handle: ConnectionHandle,
    pub profile: Option<VendorProfile>,
}

/// Pick the rendering a recipient should see.
///
/// Vendors without a known preference get the fallback language. A
/// preference outside the supported set gets the original text.
pub fn select_text<'a>(
    message: &'a ChatMessage,
    profile: Option<&VendorProfile>,
    languages: &LanguageSet,
) -> &'a str {
    match profile.and_then(|p| p.preferred_language.as_deref()) {
        Some(preferred) => message.text_for(&preferred.trim().to_ascii_lowercase()),
        None => message.text_for(languages.fallback()),
    }
}

/// Send every recipient its copy of `message`. A failed send is logged and
/// skipped; cleanup of that entry belongs to the connection's own close
/// path. Returns the number of frames handed to live connections.
pub fn fan_out(
    recipients: &[Recipient],
    message: &ChatMessage,
    sender_name: &str,
    languages: &LanguageSet,
) -> usize {
    let mut delivered = 0;

    for recipient in recipients {
        let frame = OutboundFrame::Chat(ChatFrame {
            id: message.id.clone(),
            vendor_id: message.vendor_id.clone(),
            vendor_name: sender_name.to_string(),
            message: select_text(message, recipient.profile.as_ref(), languages).to_string(),
            original_language: message.detected_language.clone(),
            timestamp: message.timestamp_iso(),
        });

        let ws_message = match frame.to_message() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode chat frame");
                continue;
            }
        };

        match recipient.handle.send(ws_message) {
            Ok(()) => delivered += 1,
            Err(e) => {
                tracing::warn!(
                    vendor_id = %recipient.vendor_id,
                    message_id = %message.id,
                    error = %e,
                    "Chat delivery failed, skipping recipient"
                );
            }
        }
    }

    delivered
}

/// Snapshot the registry, resolve every recipient's profile (and the
/// sender's display name), then fan out. The registry lock is only held for
/// the snapshot itself.
pub async fn broadcast_chat_message(state: &AppState, message: &ChatMessage) -> usize {
    let snapshot = state.connections.snapshot_all();

    let mut ids: Vec<String> = snapshot.iter().map(|(id, _)| id.clone()).collect();
    if !ids.contains(&message.vendor_id) {
        ids.push(message.vendor_id.clone());
    }

    let vendors = state.vendors.clone();
    let mut profiles = tokio::task::spawn_blocking(move || {
        ids.into_iter()
            .map(|id| {
                let profile = match vendors.lookup_vendor(&id) {
                    Ok(profile) => profile,
                    Err(e) => {
                        tracing::warn!(vendor_id = %id, error = %e, "Vendor lookup failed");
                        None
                    }
                };
                (id, profile)
            })
            .collect::<HashMap<_, _>>()
    })
    .await
    .unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Vendor lookup task failed");
        HashMap::new()
    });

    let sender_name = profiles
        .get(&message.vendor_id)
        .and_then(|p| p.as_ref())
        .map(|p| p.name.clone())
        .unwrap_or_else(|| message.vendor_id.clone());

    let recipients: Vec<Recipient> = snapshot
        .into_iter()
        .map(|(vendor_id, handle)| {
            let profile = profiles.remove(&vendor_id).flatten();
            Recipient {
                vendor_id,
                handle,
                profile,
            }
        })
        .collect();

    fan_out(
        &recipients,
        message,
        &sender_name,
        state.localizer.languages(),
    )
}
