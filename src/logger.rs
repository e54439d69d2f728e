use crate::config::AppConfig;
use logfire::{
    ShutdownHandler,
    config::{MetricsOptions, SendToLogfire},
};

/// Installs logfire as tracing subscriber, `log` logger and metrics provider.
///
/// Spans and metrics only leave the process when a Logfire token is configured.
pub fn setup_logfire(app_config: &AppConfig) -> anyhow::Result<ShutdownHandler> {
    let mut logfire_config = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()))
        .send_to_logfire(SendToLogfire::IfTokenPresent);
    if let Some(token) = &app_config.logfire_token {
        logfire_config = logfire_config.with_token(token);
    }

    Ok(logfire_config.finish()?)
}
