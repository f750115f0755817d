//! Configuration loading for the MusicBrainz album resolver
//!
//! Effective settings are resolved with the priority order:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (`BRAINZ_SERVER`, `BRAINZ_RATE_LIMIT_MS`, `BRAINZ_USER_AGENT`)
//! 3. TOML config file
//! 4. Compiled defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Public MusicBrainz server
pub const DEFAULT_SERVER: &str = "https://musicbrainz.org";

/// Minimum gap between requests to the public server, in milliseconds
pub const DEFAULT_RATE_LIMIT_MS: u64 = 2000;

/// Default HTTP timeout, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_SERVER: &str = "BRAINZ_SERVER";
pub const ENV_RATE_LIMIT_MS: &str = "BRAINZ_RATE_LIMIT_MS";
pub const ENV_USER_AGENT: &str = "BRAINZ_USER_AGENT";

/// Standard User-Agent for outbound requests (MusicBrainz rejects anonymous clients)
pub fn get_user_agent() -> String {
    format!(
        "brainz-album/{} ( https://github.com/brainz/brainz-album )",
        env!("CARGO_PKG_VERSION")
    )
}

/// MusicBrainz connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MusicBrainzConfig {
    /// Server base address, e.g. `https://musicbrainz.org`
    pub server: String,
    /// Requested minimum interval between requests (see [`Self::effective_rate_limit`])
    pub rate_limit_ms: u64,
    /// Whether downstream consumers should substitute the credited artist name
    pub replace_artist_name: bool,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            replace_artist_name: false,
            user_agent: get_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl MusicBrainzConfig {
    pub fn new(server: impl Into<String>, rate_limit_ms: u64) -> Self {
        Self {
            server: server.into(),
            rate_limit_ms,
            ..Default::default()
        }
    }

    /// Server address without trailing slashes
    pub fn server_url(&self) -> &str {
        self.server.trim_end_matches('/')
    }

    /// True when requests go to the shared public server
    pub fn is_default_server(&self) -> bool {
        self.server_url() == DEFAULT_SERVER
    }

    /// Interval actually enforced between requests, in milliseconds
    ///
    /// The public server is never queried faster than [`DEFAULT_RATE_LIMIT_MS`].
    /// Self-hosted mirrors accept any interval, including zero.
    pub fn effective_rate_limit(&self) -> u64 {
        if self.is_default_server() && self.rate_limit_ms < DEFAULT_RATE_LIMIT_MS {
            DEFAULT_RATE_LIMIT_MS
        } else {
            self.rate_limit_ms
        }
    }

    /// Override fields from `BRAINZ_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(server) = non_empty_env(ENV_SERVER) {
            info!("MusicBrainz server loaded from environment variable");
            self.server = server;
        }

        if let Some(raw) = non_empty_env(ENV_RATE_LIMIT_MS) {
            self.rate_limit_ms = raw.trim().parse().map_err(|e| {
                Error::Config(format!("{} must be an integer ({}): {}", ENV_RATE_LIMIT_MS, raw, e))
            })?;
            info!("Rate limit loaded from environment variable");
        }

        if let Some(user_agent) = non_empty_env(ENV_USER_AGENT) {
            self.user_agent = user_agent;
        }

        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// On-disk configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub musicbrainz: MusicBrainzConfig,
    pub logging: LoggingConfig,
}

/// Platform config file location: `<config dir>/brainz/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("brainz").join("config.toml"))
}

/// Load a TOML config file
///
/// A missing file is not fatal: a warning is logged and defaults are returned.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Resolve the effective configuration: TOML file (explicit or platform default),
/// then environment overrides on top
pub fn resolve_config(explicit_path: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match explicit_path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => load_toml_config(&path)?,
        None => {
            warn!("Could not determine config directory, using defaults");
            TomlConfig::default()
        }
    };

    config.musicbrainz.apply_env_overrides()?;
    Ok(config)
}

/// Write a TOML config file, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}
