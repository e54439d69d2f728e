//! # WhatsApp Outgoing Message Schemas
//!
//! This module contains data structures for sending messages to WhatsApp Business API.
//! These schemas define the JSON payload structure for various message types.

use crate::consts;
use serde::{Deserialize, Serialize};

/// What kind of message to send, always chosen by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Free form text message
    Text { body: String },
    /// Pre-approved template message
    Template { name: String, language_code: String },
}

/// A message to deliver, before recipient aliasing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub recipient: String,
    pub kind: MessageKind,
}

impl OutboundMessage {
    pub fn text(recipient: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            kind: MessageKind::Text { body: body.into() },
        }
    }

    /// Template message, `language_code` falls back to `en_US`
    pub fn template(
        recipient: impl Into<String>,
        name: impl Into<String>,
        language_code: Option<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            kind: MessageKind::Template {
                name: name.into(),
                language_code: language_code
                    .unwrap_or_else(|| consts::DEFAULT_TEMPLATE_LANGUAGE.to_string()),
            },
        }
    }

    /// Kind label used in logs and metrics
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            MessageKind::Text { .. } => "text",
            MessageKind::Template { .. } => "template",
        }
    }

    /// Builds the Graph API request body addressed to `to`
    pub fn to_request(&self, to: &str) -> OutgoingMessage {
        match &self.kind {
            MessageKind::Text { body } => OutgoingMessage::Text(OutgoingTextMessage::new(
                to.to_string(),
                body.clone(),
            )),
            MessageKind::Template {
                name,
                language_code,
            } => OutgoingMessage::Template(OutgoingTemplateMessage::new(
                to.to_string(),
                name.clone(),
                language_code.clone(),
            )),
        }
    }
}

/// Any request body accepted by the `/messages` endpoint
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    Text(OutgoingTextMessage),
    Template(OutgoingTemplateMessage),
}

/// Text message to send to WhatsApp
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingTextMessage {
    /// Messaging product, always "whatsapp"
    pub messaging_product: String,
    /// Recipient's WhatsApp ID (phone number)
    pub to: String,
    /// Message type
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Text content
    pub text: OutgoingTextContent,
}

impl OutgoingTextMessage {
    /// Creates a new text message
    pub fn new(to: String, body: String) -> Self {
        Self {
            messaging_product: "whatsapp".to_string(),
            to,
            msg_type: "text".to_string(),
            text: OutgoingTextContent { body },
        }
    }
}

/// Text content for outgoing messages
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingTextContent {
    /// Message body text
    pub body: String,
}

/// Template message to send to WhatsApp
#[derive(Debug, Serialize, Deserialize)]
pub struct OutgoingTemplateMessage {
    pub messaging_product: String,
    pub to: String,
    /// Message type, "template"
    #[serde(rename = "type")]
    pub msg_type: String,
    pub template: TemplateContent,
}

impl OutgoingTemplateMessage {
    pub fn new(to: String, name: String, language_code: String) -> Self {
        Self {
            messaging_product: "whatsapp".to_string(),
            to,
            msg_type: "template".to_string(),
            template: TemplateContent {
                name,
                language: TemplateLanguage {
                    code: language_code,
                },
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateContent {
    /// Template name as registered in Meta Business Manager
    pub name: String,
    pub language: TemplateLanguage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateLanguage {
    /// Locale code, e.g. "en_US" or "es"
    pub code: String,
}

/// Response from WhatsApp API when sending a message
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WhatsAppMessageResponse {
    /// Messaging product
    #[serde(default)]
    pub messaging_product: String,
    /// Array of messages sent
    #[serde(default)]
    pub messages: Vec<WhatsAppMessageStatus>,
}

impl WhatsAppMessageResponse {
    pub fn message_ids(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.id.as_str()).collect()
    }
}

/// Message status in response
#[derive(Debug, Serialize, Deserialize)]
pub struct WhatsAppMessageStatus {
    /// Message ID
    pub id: String,
}
