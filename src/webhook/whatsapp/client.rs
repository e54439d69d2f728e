//! # WhatsApp API Client
//!
//! This module provides a client for sending messages to WhatsApp Business API.
//! It handles recipient aliasing, authentication and the single-attempt POST to
//! the Graph `/messages` endpoint.

use super::outgoing_schemas::{OutboundMessage, WhatsAppMessageResponse};
use crate::{config::AppConfig, metric};
use async_trait::async_trait;
use derive_more::{Display, Error};
use reqwest::StatusCode;

/// Why an outbound message could not be delivered
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum SendError {
    /// The provider answered with something other than 200
    #[display("WhatsApp API returned error status {status}: {body}")]
    Provider {
        status: u16,
        #[error(not(source))]
        body: String,
    },
    #[display("connection error with the WhatsApp API: {_0}")]
    Connection(#[error(not(source))] String),
    #[display("timed out waiting for the WhatsApp API: {_0}")]
    Timeout(#[error(not(source))] String),
}

impl From<reqwest::Error> for SendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return SendError::Timeout(err.to_string());
        }
        SendError::Connection(err.to_string())
    }
}

/// Substitution table applied to recipients before sending
///
/// An identifier matching a source exactly is replaced by its target, anything
/// else is used unchanged.
#[derive(Debug, Clone, Default)]
pub struct RecipientAliases {
    aliases: Vec<(String, String)>,
}

impl RecipientAliases {
    pub fn with_alias(mut self, source: String, target: String) -> Self {
        self.aliases.push((source, target));
        self
    }

    pub fn resolve<'a>(&'a self, recipient: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(source, _)| source == recipient)
            .map(|(_, target)| target.as_str())
            .unwrap_or(recipient)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }
}

/// Anything able to deliver an [`OutboundMessage`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError>;
}

pub type ImplMessageSender = Box<dyn MessageSender>;

/// WhatsApp API client for sending messages
#[derive(Clone)]
pub struct WhatsAppClient {
    /// HTTP client for making API requests
    client: reqwest::Client,
    /// WhatsApp Business API endpoint for sending messages
    endpoint: String,
    /// Authentication token
    auth_token: String,
    aliases: RecipientAliases,
}

impl WhatsAppClient {
    /// Creates a new WhatsApp client from the startup configuration
    pub fn new(app_config: &AppConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(app_config.whatsapp_send_timeout())
            .build()?;

        let aliases = app_config.recipient_aliases();
        if !aliases.is_empty() {
            logfire::info!(
                "Recipient aliasing enabled for {count} sender(s)",
                count = aliases.len() as i64
            );
        }

        Ok(Self {
            client,
            endpoint: app_config.whatsapp_send_msg_endpoint(),
            auth_token: app_config.access_token.clone(),
            aliases,
        })
    }

    async fn post_message(&self, message: &OutboundMessage) -> Result<(), SendError> {
        let to = self.aliases.resolve(&message.recipient);
        if to != message.recipient {
            logfire::info!(
                "Recipient {from} is aliased, sending to {to}",
                from = message.recipient.clone(),
                to = to.to_string()
            );
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.auth_token)
            .json(&message.to_request(to))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());

            return Err(SendError::Provider { status, body });
        }

        // A 200 is enough, the message id is only kept for the logs
        let message_ids = response
            .json::<WhatsAppMessageResponse>()
            .await
            .map(|r| r.message_ids().join(","))
            .unwrap_or_default();

        logfire::info!(
            "Message sent to {to}: kind={kind}, ids={ids}",
            to = to.to_string(),
            kind = message.kind_name(),
            ids = message_ids
        );

        Ok(())
    }
}

#[async_trait]
impl MessageSender for WhatsAppClient {
    async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
        let result = self.post_message(message).await;

        match &result {
            Ok(()) => metric::incr_send_statds(message.kind_name(), "ok"),
            Err(e) => {
                logfire::error!(
                    "Failed to send {kind} message to {to}: {error}",
                    kind = message.kind_name(),
                    to = message.recipient.clone(),
                    error = e.to_string()
                );
                metric::incr_send_statds(message.kind_name(), "error");
            }
        }

        result
    }
}
