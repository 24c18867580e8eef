//! Application configuration.
//!
//! Read once at startup from environment variables. Every variable is
//! optional; unset variables fall back to the defaults below.
//!
//! | Variable                | Default                         |
//! |-------------------------|---------------------------------|
//! | `BIND_ADDR`             | `127.0.0.1:3000`                |
//! | `EFA_BASE_URL`          | `https://efa.vrr.de/vrr/`       |
//! | `EFA_TIMEOUT_SECS`      | `15`                            |
//! | `EFA_MOCK_DIR`          | unset (use the live API)        |
//! | `SETTINGS_PATH`         | `departure_board_settings.json` |
//! | `SEARCH_CACHE_TTL_SECS` | `300`                           |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::efa::{DEFAULT_BASE_URL, EfaConfig};

/// Default settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "departure_board_settings.json";

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// EFA endpoint base URL
    pub efa_base_url: String,
    /// Connect and read timeout for EFA requests
    pub efa_timeout_secs: u64,
    /// Serve canned payloads from this directory instead of the live API
    pub mock_dir: Option<PathBuf>,
    /// Where board settings are persisted
    pub settings_path: PathBuf,
    /// How long stop search results are cached
    pub search_cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            efa_base_url: DEFAULT_BASE_URL.to_string(),
            efa_timeout_secs: 15,
            mock_dir: None,
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            search_cache_ttl_secs: 300,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = parse_var(&lookup, "BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(url) = lookup("EFA_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.efa_base_url = url;
        }
        if let Some(secs) = parse_var(&lookup, "EFA_TIMEOUT_SECS")? {
            config.efa_timeout_secs = secs;
        }
        if let Some(dir) = lookup("EFA_MOCK_DIR").filter(|v| !v.trim().is_empty()) {
            config.mock_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = lookup("SETTINGS_PATH").filter(|v| !v.trim().is_empty()) {
            config.settings_path = PathBuf::from(path);
        }
        if let Some(secs) = parse_var(&lookup, "SEARCH_CACHE_TTL_SECS")? {
            config.search_cache_ttl_secs = secs;
        }

        Ok(config)
    }

    /// Set the listen address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the EFA base URL.
    pub fn with_efa_base_url(mut self, url: impl Into<String>) -> Self {
        self.efa_base_url = url.into();
        self
    }

    /// Set the settings file path.
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }

    /// EFA client configuration derived from these settings.
    pub fn efa_config(&self) -> EfaConfig {
        EfaConfig::new()
            .with_base_url(&self.efa_base_url)
            .with_timeout(self.efa_timeout_secs)
            .with_connect_timeout(self.efa_timeout_secs)
    }

    pub fn search_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.search_cache_ttl_secs)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}
