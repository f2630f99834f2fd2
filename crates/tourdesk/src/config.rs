//! Client configuration.
//!
//! [`ClientConfig`] gathers everything an embedding application sets
//! once: where the API lives, the auth endpoint paths, the refresh
//! cadence, and where the session is persisted. It can be built in code,
//! deserialized from a config file with serde, or read from `TOURDESK_*`
//! environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tourdesk_session::{AuthEndpoints, SessionConfig};
use tourdesk_tick::TickConfig;

/// A configuration value that could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: String, value: String },
}

/// Settings for a [`BackOffice`](crate::BackOffice) client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL, e.g. `https://api.agence.tn/v1`.
    pub base_url: String,
    /// Login endpoint, relative to `base_url`.
    pub login_endpoint: String,
    /// Refresh endpoint, relative to `base_url`.
    pub refresh_endpoint: String,
    /// Seconds between scheduled refreshes. `0` disables the timer.
    pub refresh_interval_secs: u64,
    /// Upper bound, in seconds, of the random delay added to the first
    /// refresh.
    pub refresh_jitter_secs: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Directory for the persisted session. `None` keeps it in memory.
    pub storage_dir: Option<PathBuf>,
    /// Route the user is sent to after a forced logout.
    pub login_route: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let endpoints = AuthEndpoints::default();
        Self {
            base_url: "http://localhost:8000".to_owned(),
            login_endpoint: endpoints.login,
            refresh_endpoint: endpoints.refresh,
            refresh_interval_secs: TickConfig::DEFAULT_INTERVAL.as_secs(),
            refresh_jitter_secs: 0,
            request_timeout_secs: 30,
            storage_dir: None,
            login_route: "/login".to_owned(),
        }
    }
}

impl ClientConfig {
    /// Reads `TOURDESK_*` environment variables over the defaults.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `TOURDESK_BASE_URL` | `base_url` |
    /// | `TOURDESK_LOGIN_ENDPOINT` | `login_endpoint` |
    /// | `TOURDESK_REFRESH_ENDPOINT` | `refresh_endpoint` |
    /// | `TOURDESK_REFRESH_INTERVAL_SECS` | `refresh_interval_secs` |
    /// | `TOURDESK_REFRESH_JITTER_SECS` | `refresh_jitter_secs` |
    /// | `TOURDESK_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` |
    /// | `TOURDESK_STORAGE_DIR` | `storage_dir` |
    /// | `TOURDESK_LOGIN_ROUTE` | `login_route` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("TOURDESK_BASE_URL") {
            config.base_url = v;
        }
        if let Some(v) = lookup("TOURDESK_LOGIN_ENDPOINT") {
            config.login_endpoint = v;
        }
        if let Some(v) = lookup("TOURDESK_REFRESH_ENDPOINT") {
            config.refresh_endpoint = v;
        }
        if let Some(v) = parsed(&lookup, "TOURDESK_REFRESH_INTERVAL_SECS")? {
            config.refresh_interval_secs = v;
        }
        if let Some(v) = parsed(&lookup, "TOURDESK_REFRESH_JITTER_SECS")? {
            config.refresh_jitter_secs = v;
        }
        if let Some(v) = parsed(&lookup, "TOURDESK_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout_secs = v;
        }
        if let Some(v) = lookup("TOURDESK_STORAGE_DIR").filter(|v| !v.is_empty()) {
            config.storage_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("TOURDESK_LOGIN_ROUTE") {
            config.login_route = v;
        }

        Ok(config)
    }

    pub fn auth_endpoints(&self) -> AuthEndpoints {
        AuthEndpoints {
            login: self.login_endpoint.clone(),
            refresh: self.refresh_endpoint.clone(),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            refresh: TickConfig {
                interval: Duration::from_secs(self.refresh_interval_secs),
                initial_jitter: Duration::from_secs(self.refresh_jitter_secs),
                ..TickConfig::default()
            },
            ..SessionConfig::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key: key.to_owned(),
                value,
            }),
    }
}
