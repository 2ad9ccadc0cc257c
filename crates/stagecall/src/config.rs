//! Relay configuration.

use std::time::Duration;

use stagecall_protocol::MAX_CHOICE_LEN;

use crate::StagecallError;

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

/// Period of the liveness sweep.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Shortest heartbeat the relay accepts.
const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Settings for the server and the relay actor.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Interface to listen on.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// How often connections are probed. A connection that misses one
    /// probe is evicted at the following sweep.
    pub heartbeat_interval: Duration,

    /// Longest choice forwarded to performers, in characters. Longer
    /// values are cut, not rejected.
    pub max_choice_len: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            max_choice_len: MAX_CHOICE_LEN,
        }
    }
}

impl RelayConfig {
    /// Reads `PORT` and `HOST` from the process environment. Unset or empty
    /// variables keep their defaults.
    ///
    /// # Errors
    /// [`StagecallError::Config`] if `PORT` is not a valid port number.
    pub fn from_env() -> Result<Self, StagecallError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StagecallError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(port) = var("PORT") {
            config.port = port.trim().parse().map_err(|_| {
                StagecallError::Config(format!("PORT must be a port number, got {port:?}"))
            })?;
        }
        if let Some(host) = var("HOST") {
            config.host = host.trim().to_string();
        }

        Ok(config)
    }

    /// Returns the `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Clamps out-of-range values so the config is safe to run with.
    pub fn validated(mut self) -> Self {
        if self.heartbeat_interval < MIN_HEARTBEAT_INTERVAL {
            tracing::warn!(
                interval = ?self.heartbeat_interval,
                "heartbeat interval too short, clamping"
            );
            self.heartbeat_interval = MIN_HEARTBEAT_INTERVAL;
        }
        self
    }
}
