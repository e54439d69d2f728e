//! WhatsApp webhook integration module
//!
//! ## Submodules
//!
//! - [`security`] - Handshake verification and payload signatures
//! - [`handler`] - Turns inbound messages into replies
//! - [`routes`] - HTTP endpoint handlers for WhatsApp webhooks
//! - [`schemas`] - Inbound webhook payloads
//! - [`outgoing_schemas`] - Outbound Graph API requests and responses
//! - [`client`] - WhatsApp API client for sending messages

pub mod client;
pub mod handler;
pub mod outgoing_schemas;
pub mod routes;
pub mod schemas;
pub mod security;

pub use routes::{receive, verify};
