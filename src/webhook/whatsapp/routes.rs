//! WhatsApp webhook endpoint handlers
//!
//! This module handles incoming webhook requests from WhatsApp Business API.
//! It implements both the verification endpoint (GET) and the webhook receiver (POST).
//!
//! # Security
//!
//! When an app secret is configured the POST endpoint checks the
//! `X-Hub-Signature-256` header before parsing the body.

use super::{handler, schemas, security};
use crate::{consts, errors::WebhookError, metric, server::AppState};
use futures::FutureExt;
use ntex::{util::Bytes, web};
use std::{any::Any, panic::AssertUnwindSafe};
use tracing::Instrument;

/// Webhook verification endpoint (GET)
///
/// # Query Parameters
/// - `hub.mode` - Should be "subscribe"
/// - `hub.verify_token` - Token configured in WhatsApp dashboard
/// - `hub.challenge` - Challenge string to echo back
///
/// # Returns
/// - 200 with challenge string if verification succeeds
/// - 400 if a parameter is missing or the query string can not be read
/// - 403 if mode or token are wrong
#[web::get("")]
pub async fn verify(
    req: web::HttpRequest,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    let query = web::types::Query::<schemas::VerifyQuery>::from_query(req.query_string())
        .map_err(|e| {
            logfire::warn!("Unreadable verification query: {error}", error = e.to_string());
            metric::incr_webhook_statds("verification", "missing_parameters");
            WebhookError::from(security::VerificationError::MissingParameters)
        })?;

    let challenge = security::verify_challenge(&query, &app_state.config.verify_token)
        .map_err(WebhookError::from)?;

    Ok(web::HttpResponse::Ok()
        .content_type("text/plain")
        .body(challenge))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Webhook receiver endpoint (POST)
///
/// Processed synchronously: every reply is sent before answering, and the
/// first failed send turns into the response.
#[web::post("")]
pub async fn receive(
    req: web::HttpRequest,
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<impl web::Responder, web::Error> {
    if let Some(app_secret) = &app_state.config.whatsapp_app_secret {
        let signature = req
            .headers()
            .get(consts::SIGNATURE_HEADER_NAME)
            .and_then(|value| value.to_str().ok());

        security::verify_signature(signature, &body, app_secret).map_err(WebhookError::from)?;
    }

    let payload: schemas::WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        metric::incr_webhook_statds("notification", "invalid_payload");
        WebhookError::InvalidPayload(e.to_string())
    })?;

    let dispatched = AssertUnwindSafe(
        handler::process_webhook(&payload, app_state.whatsapp_client.as_ref())
            .instrument(logfire::span!("whatsapp_webhook")),
    )
    .catch_unwind()
    .await
    .map_err(|panic| WebhookError::Internal {
        detail: panic_message(panic.as_ref()),
        expose_detail: app_state.config.expose_error_details(),
    })?;

    dispatched.map_err(|e| {
        metric::incr_webhook_statds("notification", "send_failed");
        WebhookError::from(e)
    })?;

    metric::incr_webhook_statds("notification", "processed");

    Ok(web::HttpResponse::Ok().json(&serde_json::json!({
        "status": "processed"
    })))
}
