//! Application configuration loaded from the environment.
//!
//! The configuration is built once at startup and handed to the server and the
//! WhatsApp client explicitly, so every component can be exercised with a fake
//! configuration.
//!
//! # Security Notes
//! - Sensitive fields are clearly marked and should never be logged
//! - Startup fails before binding when a required value is missing or empty

use crate::webhook::whatsapp::client::RecipientAliases;
use anyhow::bail;
use envconfig::Envconfig;
use std::time::Duration;

#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(from = "ENV", default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(from = "WEB_SERVER_HOST", default = "0.0.0.0")]
    pub web_server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(from = "WEB_SERVER_PORT", default = "5000")]
    pub web_server_port: u16,

    /// 🔒 SENSITIVE: shared secret echoed by Meta during the webhook handshake
    #[envconfig(from = "VERIFY_TOKEN")]
    pub verify_token: String,

    /// 🔒 SENSITIVE: Graph API bearer token
    #[envconfig(from = "ACCESS_TOKEN")]
    pub access_token: String,

    /// WhatsApp Business phone number ID (SEMI-SENSITIVE)
    #[envconfig(from = "PHONE_NUMBER_ID")]
    pub phone_number_id: String,

    /// Graph API version segment, e.g. "v22.0" (NON-SENSITIVE)
    #[envconfig(from = "META_API_VER")]
    pub meta_api_version: String,

    /// Graph API base URL, e.g. "https://graph.facebook.com" (NON-SENSITIVE)
    #[envconfig(from = "META_URL")]
    pub meta_url: String,

    /// Sender id whose replies must go to `recipient_alias_target` (SEMI-SENSITIVE)
    #[envconfig(from = "RECIPIENT_WAID_1")]
    pub recipient_alias_source: Option<String>,

    /// Replacement recipient for `recipient_alias_source` (SEMI-SENSITIVE)
    #[envconfig(from = "RECIPIENT_ITEM_1")]
    pub recipient_alias_target: Option<String>,

    /// 🔒 SENSITIVE: Meta app secret used to check `X-Hub-Signature-256`.
    /// Signature checking is skipped when unset.
    #[envconfig(from = "WHATSAPP_APP_SECRET")]
    pub whatsapp_app_secret: Option<String>,

    /// Upper bound for a single outbound send
    #[envconfig(from = "WHATSAPP_SEND_TIMEOUT_SECS", default = "10")]
    pub whatsapp_send_timeout_secs: u64,

    /// Exposes internal error details in responses outside production
    #[envconfig(from = "DEBUG", default = "false")]
    pub debug: bool,

    /// 🔒 SENSITIVE: Logfire write token, logs stay local when unset
    #[envconfig(from = "LOGFIRE_TOKEN")]
    pub logfire_token: Option<String>,
}

impl AppConfig {
    /// Loads the configuration from the environment and validates it.
    pub fn load() -> anyhow::Result<Self> {
        let config = Self::init_from_env()?.without_blank_optionals();
        config.validate()?;

        Ok(config)
    }

    /// A `KEY=` line in a `.env` file means unset
    pub fn without_blank_optionals(mut self) -> Self {
        for value in [
            &mut self.recipient_alias_source,
            &mut self.recipient_alias_target,
            &mut self.whatsapp_app_secret,
            &mut self.logfire_token,
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
        self
    }

    /// Rejects empty required values and half configured aliases.
    pub fn validate(&self) -> anyhow::Result<()> {
        let required = [
            ("VERIFY_TOKEN", &self.verify_token),
            ("ACCESS_TOKEN", &self.access_token),
            ("PHONE_NUMBER_ID", &self.phone_number_id),
            ("META_API_VER", &self.meta_api_version),
            ("META_URL", &self.meta_url),
        ];

        let missing = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect::<Vec<_>>();

        if !missing.is_empty() {
            bail!("missing required environment variables: {}", missing.join(", "));
        }

        let blank = [
            ("RECIPIENT_WAID_1", &self.recipient_alias_source),
            ("RECIPIENT_ITEM_1", &self.recipient_alias_target),
            ("WHATSAPP_APP_SECRET", &self.whatsapp_app_secret),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_some_and(|v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect::<Vec<_>>();

        if !blank.is_empty() {
            bail!("environment variables set but empty: {}", blank.join(", "));
        }

        match (&self.recipient_alias_source, &self.recipient_alias_target) {
            (Some(_), None) | (None, Some(_)) => {
                bail!("RECIPIENT_WAID_1 and RECIPIENT_ITEM_1 must be set together")
            }
            _ => {}
        }

        if self.whatsapp_send_timeout_secs == 0 {
            bail!("WHATSAPP_SEND_TIMEOUT_SECS must be a positive value");
        }

        Ok(())
    }

    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    /// Internal error details are only shown in debug, non production runs
    pub fn expose_error_details(&self) -> bool {
        self.debug && !self.is_prod()
    }

    /// Constructs the WhatsApp Business API endpoint for sending messages
    pub fn whatsapp_send_msg_endpoint(&self) -> String {
        format!(
            "{base}/{version}/{id}/messages",
            base = self.meta_url.trim_end_matches('/'),
            version = self.meta_api_version.trim_matches('/'),
            id = self.phone_number_id
        )
    }

    pub fn whatsapp_send_timeout(&self) -> Duration {
        Duration::from_secs(self.whatsapp_send_timeout_secs)
    }

    /// Alias table built from the single configured pair
    pub fn recipient_aliases(&self) -> RecipientAliases {
        match (&self.recipient_alias_source, &self.recipient_alias_target) {
            (Some(source), Some(target)) => {
                RecipientAliases::default().with_alias(source.clone(), target.clone())
            }
            _ => RecipientAliases::default(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_config() -> AppConfig {
        AppConfig {
            env: "local".into(),
            web_server_host: "127.0.0.1".into(),
            web_server_port: 5000,
            verify_token: "secret-token".into(),
            access_token: "access".into(),
            phone_number_id: "12345".into(),
            meta_api_version: "v22.0".into(),
            meta_url: "https://graph.facebook.com".into(),
            recipient_alias_source: None,
            recipient_alias_target: None,
            whatsapp_app_secret: None,
            whatsapp_send_timeout_secs: 10,
            debug: false,
            logfire_token: None,
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_required_values() {
        let mut config = test_config();
        config.access_token = "".into();
        config.meta_url = "  ".into();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("ACCESS_TOKEN"));
        assert!(err.contains("META_URL"));
        assert!(!err.contains("VERIFY_TOKEN"));
    }

    #[test]
    fn test_validate_rejects_blank_app_secret() {
        let mut config = test_config();
        config.whatsapp_app_secret = Some("".into());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("WHATSAPP_APP_SECRET"));
    }

    #[test]
    fn test_validate_rejects_blank_alias_values() {
        let mut blank_source = test_config();
        blank_source.recipient_alias_source = Some("".into());
        blank_source.recipient_alias_target = Some("999".into());

        let mut blank_target = test_config();
        blank_target.recipient_alias_source = Some("111".into());
        blank_target.recipient_alias_target = Some(" ".into());

        assert!(blank_source.validate().unwrap_err().to_string().contains("RECIPIENT_WAID_1"));
        assert!(blank_target.validate().unwrap_err().to_string().contains("RECIPIENT_ITEM_1"));
    }

    #[test]
    fn test_blank_optionals_read_as_unset() {
        let mut config = test_config();
        config.whatsapp_app_secret = Some("".into());
        config.recipient_alias_source = Some("".into());
        config.recipient_alias_target = Some("".into());
        config.logfire_token = Some("  ".into());

        let config = config.without_blank_optionals();

        assert!(config.whatsapp_app_secret.is_none());
        assert!(config.recipient_aliases().is_empty());
        assert!(config.logfire_token.is_none());
        assert!(config.validate().is_ok());

        let mut kept = test_config();
        kept.whatsapp_app_secret = Some("app-secret".into());
        assert_eq!(
            kept.without_blank_optionals().whatsapp_app_secret.as_deref(),
            Some("app-secret")
        );
    }

    #[test]
    fn test_validate_rejects_half_alias() {
        let mut config = test_config();
        config.recipient_alias_source = Some("111".into());

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_send_endpoint() {
        let mut config = test_config();
        config.meta_url = "https://graph.facebook.com/".into();

        assert_eq!(
            config.whatsapp_send_msg_endpoint(),
            "https://graph.facebook.com/v22.0/12345/messages"
        );
    }

    #[test]
    fn test_expose_error_details_never_in_prod() {
        let mut config = test_config();
        config.debug = true;
        assert!(config.expose_error_details());

        config.env = "PROD".into();
        assert!(!config.expose_error_details());
    }

    #[test]
    fn test_recipient_aliases_from_pair() {
        let mut config = test_config();
        config.recipient_alias_source = Some("111".into());
        config.recipient_alias_target = Some("999".into());

        let aliases = config.recipient_aliases();
        assert_eq!(aliases.resolve("111"), "999");
        assert_eq!(aliases.resolve("222"), "222");
    }
}
