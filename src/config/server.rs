//! HTTP server configuration types.

use std::time::Duration;

use serde::Deserialize;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port for the HTTP read API.
    pub port: u16,
    /// How long to wait for the consumer to drain on shutdown.
    pub shutdown_timeout_secs: u64,
    /// Directory served at `/` for the lookup page. Empty disables it.
    pub assets_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            shutdown_timeout_secs: 10,
            assets_dir: "assets".to_string(),
        }
    }
}

impl ServerConfig {
    /// `host:port` suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    pub fn assets_dir(&self) -> Option<&str> {
        Some(self.assets_dir.as_str()).filter(|dir| !dir.is_empty())
    }
}
