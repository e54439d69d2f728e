pub const APP_TITLE: &str = "wa-relay webhook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const WEBHOOK_SUBSCRIBE_MODE: &str = "subscribe";
pub const SIGNATURE_HEADER_NAME: &str = "X-Hub-Signature-256";

/// Fixed auto reply sent back for every inbound message
pub const AUTO_REPLY_BODY: &str = "Hola, ¿en qué puedo ayudarte?";
pub const DEFAULT_TEMPLATE_LANGUAGE: &str = "en_US";
