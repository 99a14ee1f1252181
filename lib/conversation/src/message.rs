//! Chat messages exchanged in a conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wallet_assistant_core::{Address, MessageId};

/// A message in a conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message identity, used to deduplicate replays.
    pub id: MessageId,
    /// Plain-text body.
    pub content: String,
    /// When the message was sent.
    pub sent_at: DateTime<Utc>,
    /// Who sent the message.
    pub sender_address: Address,
    /// Set on replies generated locally by the assistant. Display only.
    #[serde(default)]
    pub is_simulated: bool,
}

impl Message {
    /// Creates a message sent now by `sender`.
    #[must_use]
    pub fn new(sender: Address, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            content: content.into(),
            sent_at: Utc::now(),
            sender_address: sender,
            is_simulated: false,
        }
    }

    /// Creates a simulated assistant reply.
    #[must_use]
    pub fn simulated(sender: Address, content: impl Into<String>) -> Self {
        Self {
            is_simulated: true,
            ..Self::new(sender, content)
        }
    }

    /// Returns true if `address` sent this message.
    #[must_use]
    pub fn is_from(&self, address: &Address) -> bool {
        &self.sender_address == address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_creation() {
        let msg = Message::new(Address::new("0xUser"), "hello");
        assert_eq!(msg.content, "hello");
        assert!(!msg.is_simulated);
        assert!(msg.is_from(&Address::new("0xuser")));
    }

    #[test]
    fn simulated_messages_are_flagged() {
        let msg = Message::simulated(Address::new("0xagent"), "hi");
        assert!(msg.is_simulated);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let msg = Message::new(Address::new("0xuser"), "hello");
        let json = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(json["senderAddress"], "0xuser");
        assert_eq!(json["isSimulated"], false);
        assert!(json.get("sentAt").is_some());
    }

    #[test]
    fn missing_simulated_flag_defaults_to_false() {
        let msg = Message::new(Address::new("0xuser"), "hello");
        let mut json = serde_json::to_value(&msg).expect("serialize");
        json.as_object_mut().expect("object").remove("isSimulated");

        let parsed: Message = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed, msg);
    }
}
