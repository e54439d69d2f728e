//! # WhatsApp Webhook Schemas
//!
//! Data structures for the JSON payloads Meta POSTs to the webhook and the
//! query string it sends during the verification handshake.
//!
//! Only the shape the relay relies on is typed: `entry[].changes[].value` must
//! be present and well formed, everything below `value` other than `messages`
//! is kept as an untyped map. Unknown keys are ignored at every level.

use serde::{Deserialize, Serialize};

/// Query parameters for webhook verification
///
/// Every field is optional so that an absent parameter can be reported as
/// such instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    /// The mode parameter, should be "subscribe"
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    /// The verification token from WhatsApp
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    /// The challenge string to echo back
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Root webhook payload from WhatsApp
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookPayload {
    /// Array of entry objects containing the actual data
    pub entry: Vec<Entry>,
}

/// Entry object containing changes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Entry {
    /// Array of changes that occurred
    pub changes: Vec<Change>,
}

/// Change object containing the actual webhook data
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Change {
    pub value: ChangeValue,
}

/// Loosely typed `value` object, only `messages` is interpreted
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChangeValue {
    /// Array of messages received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Message>>,
    /// Metadata, contacts, statuses and anything else Meta sends
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Message object
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    /// Sender's WhatsApp ID (phone number)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Text message content (if type is "text")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextMessage>,
}

impl Message {
    /// Sender id, `None` when absent or empty
    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().filter(|from| !from.is_empty())
    }

    /// Text body, empty when the message has no text part
    pub fn text_body(&self) -> &str {
        self.text
            .as_ref()
            .and_then(|text| text.body.as_deref())
            .unwrap_or_default()
    }
}

/// Text message content
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextMessage {
    /// The text body of the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}
