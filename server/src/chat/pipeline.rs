//! The detect → translate → persist → fan-out sequence run once per
//! inbound chat frame.

use chrono::Utc;

use crate::chat::{broadcast, ChatMessage};
use crate::db::models::{NewChatMessage, StoredMessage};
use crate::i18n::Localized;
use crate::state::AppState;

/// Maximum chat text length (chars).
pub const MAX_CHAT_LENGTH: usize = 4000;

/// Trimmed chat text, or `None` if it is empty or too long to relay.
pub fn normalize_chat_text(text: &str) -> Option<&str> {
    let text = text.trim();
    if text.is_empty() || text.chars().count() > MAX_CHAT_LENGTH {
        return None;
    }
    Some(text)
}

/// Localize, persist and broadcast one chat message from `vendor_id`.
///
/// Storage failures are logged and do not stop delivery; the message then
/// carries a provisional id and timestamp assigned here. Returns the
/// message as relayed, or `None` if localization itself failed.
pub async fn relay_chat(state: &AppState, vendor_id: &str, text: &str) -> Option<ChatMessage> {
    let localizer = state.localizer.clone();
    let source = text.to_string();
    let localized: Localized =
        match tokio::task::spawn_blocking(move || localizer.localize(&source)).await {
            Ok(localized) => localized,
            Err(e) => {
                tracing::error!(vendor_id = %vendor_id, error = %e, "Localization task failed");
                return None;
            }
        };

    let new_message = NewChatMessage {
        vendor_id: vendor_id.to_string(),
        text: text.to_string(),
        detected_language: localized.detected_language,
        variants: localized.variants,
    };

    let stored = persist(state, &new_message).await;

    let message = ChatMessage {
        id: stored.id,
        vendor_id: new_message.vendor_id,
        text: new_message.text,
        detected_language: new_message.detected_language,
        variants: new_message.variants,
        timestamp: stored.timestamp,
    };

    let delivered = broadcast::broadcast_chat_message(state, &message).await;

    tracing::info!(
        vendor_id = %message.vendor_id,
        message_id = %message.id,
        language = %message.detected_language,
        delivered,
        "Chat message relayed"
    );

    Some(message)
}

async fn persist(state: &AppState, message: &NewChatMessage) -> StoredMessage {
    let store = state.messages.clone();
    let to_store = message.clone();

    let result = tokio::task::spawn_blocking(move || store.persist_chat_message(&to_store)).await;

    match result {
        Ok(Ok(stored)) => stored,
        Ok(Err(e)) => {
            tracing::warn!(
                vendor_id = %message.vendor_id,
                error = %e,
                "Failed to persist chat message, relaying anyway"
            );
            provisional()
        }
        Err(e) => {
            tracing::warn!(
                vendor_id = %message.vendor_id,
                error = %e,
                "Chat persistence task failed, relaying anyway"
            );
            provisional()
        }
    }
}

fn provisional() -> StoredMessage {
    StoredMessage {
        id: uuid::Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize_chat_text("  Hola  "), Some("Hola"));
    }

    #[test]
    fn test_normalize_rejects_blank() {
        assert_eq!(normalize_chat_text(""), None);
        assert_eq!(normalize_chat_text(" \n\t "), None);
    }

    #[test]
    fn test_normalize_length_limit_counts_chars() {
        let at_limit = "é".repeat(MAX_CHAT_LENGTH);
        assert!(normalize_chat_text(&at_limit).is_some());
        let over = "a".repeat(MAX_CHAT_LENGTH + 1);
        assert!(normalize_chat_text(&over).is_none());
    }
}
