//! Configuration for the Terminus CLI.
//!
//! Settings are read from a small JSON file in the standard configuration
//! directory (`~/.config/terminus/config.json` on most platforms) and then
//! overridden by `TERMINUS_*` environment variables. Every field is optional in
//! the file; missing fields fall back to defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs_next::{config_dir, home_dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "TERMINUS_CONFIG_PATH";
/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const HOST_ENV: &str = "TERMINUS_HOST";
pub const CACHE_DIR_ENV: &str = "TERMINUS_CACHE_DIR";
pub const POLL_INTERVAL_ENV: &str = "TERMINUS_POLL_INTERVAL";
pub const MAX_WAIT_ENV: &str = "TERMINUS_MAX_WAIT";
pub const TRANSPORT_RETRIES_ENV: &str = "TERMINUS_TRANSPORT_RETRIES";

pub const DEFAULT_HOST: &str = "https://terminus.pantheon.io/api/";
/// Matches the platform's workflow status update cadence.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_TRANSPORT_RETRIES: u32 = 3;

/// Error surfaced when reading configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure (for example, permissions).
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A setting holds a value that cannot be used.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Resolved CLI settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminusConfig {
    /// Base URL of the platform API.
    pub host: String,
    /// Directory holding the session file. Defaults to `~/.terminus/cache`.
    pub cache_dir: Option<PathBuf>,
    /// Seconds between workflow status polls.
    pub poll_interval_secs: u64,
    /// Upper bound on a single workflow wait, in seconds. Unbounded when absent.
    pub max_wait_secs: Option<u64>,
    /// Consecutive transient transport failures tolerated while polling.
    pub transport_retries: u32,
}

impl Default for TerminusConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            cache_dir: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_wait_secs: None,
            transport_retries: DEFAULT_TRANSPORT_RETRIES,
        }
    }
}

impl TerminusConfig {
    /// Load the config file from its default location and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_config_path();
        Self::load_from(&path)?.apply_env_overrides()
    }

    /// Read settings from `path` without consulting the environment.
    ///
    /// A missing file yields defaults. A file that cannot be parsed is logged
    /// and also yields defaults, so a typo never locks the user out of the CLI.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str::<TerminusConfig>(&data) {
                Ok(config) => config,
                Err(error) => {
                    warn!(
                        path = %path.display(),
                        error = %error,
                        "Failed to parse config file; using defaults"
                    );
                    TerminusConfig::default()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => TerminusConfig::default(),
            Err(error) => return Err(ConfigError::Io(error)),
        };
        debug!(path = %path.display(), "loaded config");
        config.validated()
    }

    /// Apply `TERMINUS_*` environment overrides on top of file settings.
    pub fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(host) = env_value(HOST_ENV) {
            self.host = host;
        }
        if let Some(cache_dir) = env_value(CACHE_DIR_ENV) {
            self.cache_dir = Some(expand_tilde(&cache_dir));
        }
        if let Some(raw) = env_value(POLL_INTERVAL_ENV) {
            self.poll_interval_secs = parse_number(POLL_INTERVAL_ENV, &raw)?;
        }
        if let Some(raw) = env_value(MAX_WAIT_ENV) {
            self.max_wait_secs = Some(parse_number(MAX_WAIT_ENV, &raw)?);
        }
        if let Some(raw) = env_value(TRANSPORT_RETRIES_ENV) {
            self.transport_retries = parse_number(TRANSPORT_RETRIES_ENV, &raw)?;
        }
        self.validated()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    /// Directory holding the cached session.
    pub fn cache_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => expand_tilde(&dir.to_string_lossy()),
            None => home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".terminus").join("cache"),
        }
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll_interval_secs",
                value: "0".into(),
                reason: "the poll interval must be at least one second".into(),
            });
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "host",
                value: self.host,
                reason: "the API host cannot be empty".into(),
            });
        }
        Ok(self)
    }
}

/// Path of the config file, honouring [`CONFIG_PATH_ENV`].
pub fn default_config_path() -> PathBuf {
    if let Some(path) = env_value(CONFIG_PATH_ENV) {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("terminus")
        .join(CONFIG_FILE_NAME)
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        Some(rest) => home().join(rest),
        None => PathBuf::from(trimmed),
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|error| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: error.to_string(),
    })
}
