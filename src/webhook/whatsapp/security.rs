//! Security checks for the WhatsApp webhook
//!
//! Two independent checks live here:
//!
//! - [`verify_challenge`]: the GET handshake Meta performs once to confirm
//!   endpoint ownership (`hub.mode`, `hub.verify_token`, `hub.challenge`).
//! - [`verify_signature`]: the `X-Hub-Signature-256` HMAC-SHA256 signature
//!   Meta attaches to every POST when an app secret is configured.
//!
//! Secrets are compared in constant time and are never logged; a failed token
//! comparison only logs that the tokens differ.

use crate::{consts, metric, webhook::whatsapp::schemas::VerifyQuery};
use derive_more::{Display, Error};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Why a verification handshake was refused
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[display("missing hub.mode, hub.verify_token or hub.challenge")]
    MissingParameters,
    #[display("invalid verification mode: {provided}")]
    InvalidMode {
        #[error(not(source))]
        provided: String,
    },
    #[display("invalid verification token")]
    InvalidToken,
}

/// Why a POST signature was refused
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[display("missing signature header")]
    MissingHeader,
    #[display("malformed signature header")]
    MalformedHeader,
    #[display("signature mismatch")]
    Mismatch,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Validates the verification handshake and returns the challenge to echo.
///
/// Checks run in a fixed order so the reported error is deterministic:
/// missing parameters first, then mode, then token.
pub fn verify_challenge(
    query: &VerifyQuery,
    expected_token: &str,
) -> Result<String, VerificationError> {
    let (Some(mode), Some(token), Some(challenge)) = (
        present(&query.mode),
        present(&query.verify_token),
        present(&query.challenge),
    ) else {
        logfire::warn!(
            "Webhook verification missing parameters: mode={mode}, token={token}, challenge={challenge}",
            mode = present(&query.mode).is_some(),
            token = present(&query.verify_token).is_some(),
            challenge = present(&query.challenge).is_some()
        );
        metric::incr_webhook_statds("verification", "missing_parameters");
        return Err(VerificationError::MissingParameters);
    };

    if mode != consts::WEBHOOK_SUBSCRIBE_MODE {
        logfire::warn!(
            "Invalid verification mode: expected 'subscribe', got '{mode}'",
            mode = mode.to_string()
        );
        metric::incr_webhook_statds("verification", "invalid_mode");
        return Err(VerificationError::InvalidMode {
            provided: mode.to_string(),
        });
    }

    let token_matches: bool = token.as_bytes().ct_eq(expected_token.as_bytes()).into();
    if !token_matches {
        logfire::warn!("Invalid verify token: provided token does not match the configured one");
        metric::incr_webhook_statds("verification", "invalid_token");
        return Err(VerificationError::InvalidToken);
    }

    logfire::info!("Webhook verification successful");
    metric::incr_webhook_statds("verification", "ok");

    Ok(challenge.to_string())
}

/// Verifies an `X-Hub-Signature-256` header (`sha256=<hex>`) against the raw
/// request body.
///
/// The signature MUST be computed over the raw bytes, before any JSON parsing.
pub fn verify_signature(
    signature_header: Option<&str>,
    payload: &[u8],
    app_secret: &str,
) -> Result<(), SignatureError> {
    let signature_hex = signature_header
        .ok_or(SignatureError::MissingHeader)?
        .strip_prefix("sha256=")
        .ok_or(SignatureError::MalformedHeader)?;

    let expected_signature =
        hex::decode(signature_hex).map_err(|_| SignatureError::MalformedHeader)?;

    // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(payload);
    let computed_signature = mac.finalize().into_bytes();

    if bool::from(computed_signature.ct_eq(&expected_signature[..])) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}
