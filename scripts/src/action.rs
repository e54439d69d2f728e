use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use wa_relay::{
    config::AppConfig,
    consts, logger, server,
    webhook::whatsapp::{
        client::{MessageSender, WhatsAppClient},
        outgoing_schemas::OutboundMessage,
    },
};

use crate::{config::TunnelConfig, tunnel::NgrokTunnel};

#[derive(Args, Debug, Clone)]
pub struct SendTemplateArgs {
    /// Recipient WhatsApp id
    #[arg(long)]
    to: String,
    #[arg(long, default_value = "hello_world")]
    name: String,
    #[arg(long, default_value = consts::DEFAULT_TEMPLATE_LANGUAGE)]
    language: String,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Action {
    /// Print the running ngrok tunnel, if any
    TunnelStatus,
    /// Start the ngrok tunnel unless one is already running
    EnsureTunnel,
    /// Send a template message with the server credentials
    SendTemplate(SendTemplateArgs),
    /// Make sure the tunnel is up, then run the webhook server
    Serve,
}

/// Helpers to run wa-relay locally
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct AppArgs {
    #[command(subcommand)]
    pub action: Action,
}

impl AppArgs {
    pub async fn run(&self) -> anyhow::Result<()> {
        match &self.action {
            Action::TunnelStatus => {
                let ngrok = NgrokTunnel::new(&TunnelConfig::load()?)?;

                match ngrok.get_active_tunnel().await {
                    Some(tunnel) => log::info!("Tunnel active: {tunnel}"),
                    None => log::info!("No active ngrok tunnel"),
                }
                Ok(())
            }
            Action::EnsureTunnel => {
                let ngrok = NgrokTunnel::new(&TunnelConfig::load()?)?;

                let status = ngrok.ensure_tunnel().await?;
                log::info!("{status}");
                Ok(())
            }
            Action::SendTemplate(SendTemplateArgs { to, name, language }) => {
                let client = WhatsAppClient::new(&AppConfig::load()?)?;

                client
                    .send(&OutboundMessage::template(
                        to.as_str(),
                        name.as_str(),
                        Some(language.clone()),
                    ))
                    .await
                    .context("template message was not delivered")?;

                log::info!("Template {name} ({language}) sent to {to}");
                Ok(())
            }
            Action::Serve => {
                let app_config = AppConfig::load()?;
                let tunnel_config = TunnelConfig::load()?;
                let shutdown_handler = logger::setup_logfire(&app_config)?;

                let status = NgrokTunnel::new(&tunnel_config)?.ensure_tunnel().await?;
                log::info!("{status}");

                server::run_server(app_config).await?;

                shutdown_handler.shutdown()?;
                Ok(())
            }
        }
    }
}
