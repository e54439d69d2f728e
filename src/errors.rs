//! Errors returned by the HTTP handlers and how they are rendered.
//!
//! Core functions return their own error kinds ([`VerificationError`],
//! [`SignatureError`], [`SendError`]); this is the only place that maps a kind
//! to a status code and a JSON body.

use crate::webhook::whatsapp::{
    client::SendError,
    security::{SignatureError, VerificationError},
};
use derive_more::{Display, Error, From};
use ntex::{http, web};
use serde_json::{Value, json};

#[derive(Debug, Display, Error, From)]
pub enum WebhookError {
    Verification(VerificationError),
    Signature(SignatureError),
    #[display("invalid webhook payload: {_0}")]
    #[from(ignore)]
    InvalidPayload(#[error(not(source))] String),
    Send(SendError),
    #[display("url not found")]
    #[from(ignore)]
    UrlNotFound,
    #[display("internal error: {detail}")]
    #[from(ignore)]
    Internal {
        #[error(not(source))]
        detail: String,
        expose_detail: bool,
    },
}

impl WebhookError {
    /// Title, details and extra data of the JSON body
    fn body_parts(&self) -> (&'static str, String, Value) {
        match self {
            WebhookError::Verification(VerificationError::MissingParameters) => (
                "Webhook Error",
                "Missing parameters: 'hub.mode', 'hub.verify_token' and 'hub.challenge' are required."
                    .to_string(),
                json!({}),
            ),
            WebhookError::Verification(VerificationError::InvalidMode { provided }) => (
                "Webhook Error",
                format!("Invalid verification mode: {provided}. Only 'subscribe' is accepted."),
                json!({ "provided_mode": provided }),
            ),
            WebhookError::Verification(VerificationError::InvalidToken) => (
                "Webhook Error",
                "Invalid verification token.".to_string(),
                json!({ "token_matches": false }),
            ),
            WebhookError::Signature(e) => (
                "Webhook Error",
                format!("Invalid payload signature: {e}."),
                json!({}),
            ),
            WebhookError::InvalidPayload(msg) => ("Validation Error", msg.clone(), json!({})),
            WebhookError::Send(SendError::Provider { status, body }) => (
                "Upstream Error",
                "WhatsApp API rejected the message.".to_string(),
                json!({ "provider_status": status, "provider_body": body }),
            ),
            WebhookError::Send(SendError::Connection(_)) => (
                "Upstream Error",
                "Connection error with the WhatsApp server.".to_string(),
                json!({}),
            ),
            WebhookError::Send(SendError::Timeout(_)) => (
                "Upstream Error",
                "Timed out waiting for the WhatsApp server.".to_string(),
                json!({}),
            ),
            WebhookError::UrlNotFound => ("Not Found", "resource not found".to_string(), json!({})),
            WebhookError::Internal {
                detail,
                expose_detail,
            } => (
                "Internal Server Error",
                "Internal Server Error".to_string(),
                if *expose_detail {
                    json!({ "message": detail })
                } else {
                    json!({})
                },
            ),
        }
    }
}

impl web::error::WebResponseError for WebhookError {
    fn error_response(&self, _: &web::HttpRequest) -> web::HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            logfire::error!("{error}", error = format!("{:#?}", self));
        } else {
            logfire::warn!("{error}", error = self.to_string());
        }

        let (title, details, extra_data) = self.body_parts();

        web::HttpResponse::build(status).json(&json!({
            "error": title,
            "details": details,
            "extra_data": extra_data,
        }))
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            WebhookError::Verification(VerificationError::MissingParameters) => {
                http::StatusCode::BAD_REQUEST
            }
            WebhookError::Verification(_) | WebhookError::Signature(_) => {
                http::StatusCode::FORBIDDEN
            }
            WebhookError::InvalidPayload(_) => http::StatusCode::UNPROCESSABLE_ENTITY,
            WebhookError::Send(SendError::Provider { .. }) => http::StatusCode::BAD_GATEWAY,
            WebhookError::Send(_) | WebhookError::Internal { .. } => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
            WebhookError::UrlNotFound => http::StatusCode::NOT_FOUND,
        }
    }
}
