use anyhow::bail;
use envconfig::Envconfig;
use std::time::Duration;

#[derive(Envconfig, Clone)]
pub struct TunnelConfig {
    /// Command starting the tunnel, e.g. `ngrok start metafastapi`
    #[envconfig(from = "NGROK_COMMAND")]
    pub command: String,

    /// Seconds to wait for a freshly started tunnel
    #[envconfig(from = "NGROK_TIMEOUT", default = "10")]
    pub timeout_secs: u64,

    /// Local agent API listing the running tunnels
    #[envconfig(from = "NGROK_API_URL", default = "http://127.0.0.1:4040/api/tunnels")]
    pub api_url: String,
}

impl TunnelConfig {
    pub fn load() -> anyhow::Result<Self> {
        let config = Self::init_from_env()?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.command.split_whitespace().next().is_none() {
            bail!("NGROK_COMMAND can not be empty");
        }
        if self.timeout_secs == 0 {
            bail!("NGROK_TIMEOUT must be a positive value");
        }

        Ok(())
    }

    /// One poll per second, so the timeout is also the number of attempts
    pub fn poll_attempts(&self) -> u64 {
        self.timeout_secs
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(1)
    }
}
