//! ngrok tunnel helper
//!
//! Reads the local agent API to find a running tunnel and, when none is up,
//! starts one with the configured command and waits for it to show up.

use crate::config::TunnelConfig;
use anyhow::{Context, bail};
use serde::Deserialize;
use std::{fmt, process::Stdio, time::Duration};
use tokio::process::Command;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TunnelAddr {
    #[serde(default)]
    pub addr: Option<String>,
}

/// One entry of the agent `/api/tunnels` listing
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Tunnel {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default)]
    pub config: TunnelAddr,
}

impl fmt::Display for Tunnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "name={} public_url={} private_url={}",
            self.name.as_deref().unwrap_or("-"),
            self.public_url.as_deref().unwrap_or("-"),
            self.config.addr.as_deref().unwrap_or("-")
        )
    }
}

#[derive(Debug, Deserialize)]
struct TunnelList {
    #[serde(default)]
    tunnels: Vec<Tunnel>,
}

#[derive(Debug, PartialEq)]
pub enum TunnelStatus {
    /// Already running before the call
    Active(Tunnel),
    /// Started by the call
    Created(Tunnel),
}

impl fmt::Display for TunnelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TunnelStatus::Active(tunnel) => write!(f, "Tunnel active: {tunnel}"),
            TunnelStatus::Created(tunnel) => write!(f, "Tunnel created: {tunnel}"),
        }
    }
}

pub struct NgrokTunnel {
    client: reqwest::Client,
    api_url: String,
    command: String,
    poll_attempts: u64,
    poll_interval: Duration,
}

impl NgrokTunnel {
    pub fn new(config: &TunnelConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            command: config.command.clone(),
            poll_attempts: config.poll_attempts(),
            poll_interval: config.poll_interval(),
        })
    }

    async fn list_tunnels(&self) -> anyhow::Result<Vec<Tunnel>> {
        let tunnels = self
            .client
            .get(&self.api_url)
            .send()
            .await?
            .error_for_status()?
            .json::<TunnelList>()
            .await?;

        Ok(tunnels.tunnels)
    }

    /// First tunnel reported by the agent
    ///
    /// An unreachable or misbehaving agent counts as no tunnel.
    pub async fn get_active_tunnel(&self) -> Option<Tunnel> {
        match self.list_tunnels().await {
            Ok(tunnels) => tunnels.into_iter().next(),
            Err(e) => {
                log::warn!("could not query the ngrok agent at {}: {e}", self.api_url);
                None
            }
        }
    }

    /// Spawns the tunnel command detached from this process
    pub fn start_tunnel(&self) -> anyhow::Result<()> {
        let parts = self.command.split_whitespace().collect::<Vec<_>>();
        let Some((program, args)) = parts.split_first() else {
            bail!("NGROK_COMMAND can not be empty");
        };

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to start tunnel command `{}`", self.command))?;

        log::info!(
            "tunnel command started with pid {}",
            child.id().map(|id| id.to_string()).unwrap_or_default()
        );

        Ok(())
    }

    /// Polls the agent until a tunnel shows up or the attempts run out
    pub async fn wait_for_tunnel(&self) -> Option<Tunnel> {
        for attempt in 1..=self.poll_attempts {
            log::info!("waiting for the tunnel... {attempt}/{}", self.poll_attempts);
            tokio::time::sleep(self.poll_interval).await;

            if let Some(tunnel) = self.get_active_tunnel().await {
                return Some(tunnel);
            }
        }

        None
    }

    /// Reports the running tunnel, starting one first if needed
    pub async fn ensure_tunnel(&self) -> anyhow::Result<TunnelStatus> {
        log::info!("looking for an active ngrok tunnel");
        if let Some(tunnel) = self.get_active_tunnel().await {
            return Ok(TunnelStatus::Active(tunnel));
        }

        log::info!("no active tunnel found, starting one");
        self.start_tunnel()?;

        match self.wait_for_tunnel().await {
            Some(tunnel) => Ok(TunnelStatus::Created(tunnel)),
            None => bail!(
                "could not detect nor create the ngrok tunnel after {} attempts",
                self.poll_attempts
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const TUNNELS_PATH: &str = "/api/tunnels";

    fn ngrok_for(server: &MockServer, command: &str) -> NgrokTunnel {
        let config = test_config(format!("{}{TUNNELS_PATH}", server.uri()), command);
        let mut ngrok = NgrokTunnel::new(&config).unwrap();
        ngrok.poll_interval = Duration::from_millis(10);
        ngrok
    }

    fn listing() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "tunnels": [
                {
                    "name": "metafastapi",
                    "public_url": "https://relay.ngrok.app",
                    "proto": "https",
                    "config": {"addr": "http://localhost:5000", "inspect": true}
                },
                {
                    "name": "other",
                    "public_url": "https://other.ngrok.app",
                    "config": {"addr": "http://localhost:8080"}
                }
            ],
            "uri": "/api/tunnels"
        }))
    }

    fn empty_listing() -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"tunnels": [], "uri": "/api/tunnels"}))
    }

    fn relay_tunnel() -> Tunnel {
        Tunnel {
            name: Some("metafastapi".into()),
            public_url: Some("https://relay.ngrok.app".into()),
            config: TunnelAddr {
                addr: Some("http://localhost:5000".into()),
            },
        }
    }

    #[tokio::test]
    async fn test_first_tunnel_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TUNNELS_PATH))
            .respond_with(listing())
            .mount(&server)
            .await;

        let ngrok = ngrok_for(&server, "ngrok start metafastapi");

        assert_eq!(ngrok.get_active_tunnel().await, Some(relay_tunnel()));
    }

    #[tokio::test]
    async fn test_no_tunnel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TUNNELS_PATH))
            .respond_with(empty_listing())
            .mount(&server)
            .await;

        let ngrok = ngrok_for(&server, "ngrok start metafastapi");

        assert_eq!(ngrok.get_active_tunnel().await, None);
    }

    #[tokio::test]
    async fn test_agent_errors_count_as_no_tunnel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let ngrok = ngrok_for(&server, "ngrok start metafastapi");
        assert_eq!(ngrok.get_active_tunnel().await, None);

        let config = test_config("http://127.0.0.1:9/api/tunnels".into(), "ngrok");
        let unreachable = NgrokTunnel::new(&config).unwrap();
        assert_eq!(unreachable.get_active_tunnel().await, None);
    }

    #[tokio::test]
    async fn test_ensure_tunnel_keeps_active_one() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TUNNELS_PATH))
            .respond_with(listing())
            .expect(1)
            .mount(&server)
            .await;

        // spawning this would fail the test
        let ngrok = ngrok_for(&server, "wa-relay-missing-binary");

        let status = ngrok.ensure_tunnel().await.unwrap();

        assert_eq!(status, TunnelStatus::Active(relay_tunnel()));
    }

    #[tokio::test]
    async fn test_ensure_tunnel_starts_and_waits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TUNNELS_PATH))
            .respond_with(empty_listing())
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(TUNNELS_PATH))
            .respond_with(listing())
            .mount(&server)
            .await;

        let ngrok = ngrok_for(&server, "true");

        let status = ngrok.ensure_tunnel().await.unwrap();

        assert_eq!(status, TunnelStatus::Created(relay_tunnel()));
    }

    #[tokio::test]
    async fn test_ensure_tunnel_gives_up_after_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TUNNELS_PATH))
            .respond_with(empty_listing())
            // initial lookup plus one per attempt
            .expect(4)
            .mount(&server)
            .await;

        let ngrok = ngrok_for(&server, "true");

        assert!(ngrok.ensure_tunnel().await.is_err());
    }

    #[tokio::test]
    async fn test_ensure_tunnel_fails_when_command_cannot_start() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TUNNELS_PATH))
            .respond_with(empty_listing())
            .mount(&server)
            .await;

        let ngrok = ngrok_for(&server, "wa-relay-missing-binary --flag");

        let err = ngrok.ensure_tunnel().await.unwrap_err();

        assert!(err.to_string().contains("wa-relay-missing-binary"));
    }
}
