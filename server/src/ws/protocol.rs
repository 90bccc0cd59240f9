//! JSON wire format spoken over the relay WebSocket.

use axum::extract::ws::Message;
use serde::{Deserialize, Serialize};

/// Frame sent by a vendor client.
///
/// Unrecognised `type` values decode to [`InboundFrame::Unknown`]; missing
/// fields decode as empty strings and are rejected by the session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InboundFrame {
    Register {
        #[serde(rename = "vendorId", default)]
        vendor_id: String,
    },
    Chat {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Chat { .. } => "chat",
            Self::Unknown => "unknown",
        }
    }
}

/// Frame sent to a vendor client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    Chat(ChatFrame),
}

/// One recipient's copy of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatFrame {
    pub id: String,
    pub vendor_id: String,
    pub vendor_name: String,
    /// Text rendered in the recipient's language.
    pub message: String,
    pub original_language: String,
    /// ISO-8601, UTC.
    pub timestamp: String,
}

impl OutboundFrame {
    pub fn to_message(&self) -> Result<Message, serde_json::Error> {
        Ok(Message::Text(serde_json::to_string(self)?.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_register() {
        let frame = InboundFrame::parse(r#"{"type":"register","vendorId":"VM1234"}"#).unwrap();
        assert_eq!(
            frame,
            InboundFrame::Register {
                vendor_id: "VM1234".to_string()
            }
        );
    }

    #[test]
    fn test_parse_chat_ignores_extra_fields() {
        let frame =
            InboundFrame::parse(r#"{"type":"chat","text":"Hola","vendorId":"VM1"}"#).unwrap();
        assert_eq!(
            frame,
            InboundFrame::Chat {
                text: "Hola".to_string()
            }
        );
    }

    #[test]
    fn test_parse_missing_fields_default_to_empty() {
        let frame = InboundFrame::parse(r#"{"type":"register"}"#).unwrap();
        assert_eq!(
            frame,
            InboundFrame::Register {
                vendor_id: String::new()
            }
        );
    }

    #[test]
    fn test_parse_unknown_type() {
        let frame = InboundFrame::parse(r#"{"type":"typing"}"#).unwrap();
        assert_eq!(frame, InboundFrame::Unknown);
        assert_eq!(frame.kind(), "unknown");
    }

    #[test]
    fn test_parse_malformed() {
        assert!(InboundFrame::parse("not json").is_err());
        assert!(InboundFrame::parse(r#"{"text":"no type"}"#).is_err());
        assert!(InboundFrame::parse(r#"{"type":"chat","text":42}"#).is_err());
    }

    #[test]
    fn test_outbound_chat_shape() {
        let frame = OutboundFrame::Chat(ChatFrame {
            id: "m1".to_string(),
            vendor_id: "VM0001".to_string(),
            vendor_name: "Fruit Stall".to_string(),
            message: "Bonjour everyone".to_string(),
            original_language: "en".to_string(),
            timestamp: "2024-05-01T10:00:00.000Z".to_string(),
        });

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "chat",
                "id": "m1",
                "vendorId": "VM0001",
                "vendorName": "Fruit Stall",
                "message": "Bonjour everyone",
                "originalLanguage": "en",
                "timestamp": "2024-05-01T10:00:00.000Z",
            })
        );
    }
}
