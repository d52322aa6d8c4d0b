//! Configuration types.

use crate::auth::DEFAULT_LOGIN_DELAY_MS;
use crate::query::WeekStart;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 31995;

/// Name of the per-user config/state directory under `$HOME`.
pub const USER_DIR_NAME: &str = ".taskflow";

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP API (default: 31995).
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Simulated login latency in milliseconds (default: 1000).
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_delay_ms: default_login_delay_ms(),
        }
    }
}

impl AuthConfig {
    pub fn login_delay(&self) -> Duration {
        Duration::from_millis(self.login_delay_ms)
    }
}

fn default_login_delay_ms() -> u64 {
    DEFAULT_LOGIN_DELAY_MS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session record file (default: `~/.taskflow/session.json`).
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

fn default_session_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(USER_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(USER_DIR_NAME))
        .join("session.json")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixturesConfig {
    /// Dataset to seed from; the embedded dataset when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// First day of the week for the weekly series and calendar grid.
    #[serde(default)]
    pub week_start: WeekStart,
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub fixtures: FixturesConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

impl Config {
    /// Load a single config file without tier merging.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        // Empty or comment-only files parse as null
        let config: Option<Config> = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config.unwrap_or_default())
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
