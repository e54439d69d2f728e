//! # wa-relay
//!
//! WhatsApp Business webhook relay: answers the subscription handshake, receives
//! message notifications and replies to each sender through the Graph API.

pub mod config;
pub mod consts;
pub mod errors;
pub mod logger;
pub mod metric;
pub mod server;
pub mod webhook;
