//! Chat relay: localization, persistence and fan-out of vendor messages,
//! plus presence side effects and the read-only REST views.

pub mod broadcast;
pub mod messages;
pub mod pipeline;
pub mod presence;

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

/// A relayed chat message. Built once per inbound chat frame and never
/// modified afterwards; fan-out reads from this copy, not from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub vendor_id: String,
    pub text: String,
    pub detected_language: String,
    pub variants: BTreeMap<String, String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Text for a recipient preferring `language`; the original text when
    /// no variant exists for it.
    pub fn text_for(&self, language: &str) -> &str {
        self.variants
            .get(language)
            .map(String::as_str)
            .unwrap_or(&self.text)
    }

    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
