//! Player configuration
//!
//! ```yaml
//! bulb:
//!   driver: hue
//!   bridge: 192.168.1.2
//!   username: 1028d66426293e821ecfd9ef1a0731df
//!   timeout_secs: 5
//! playback:
//!   backoff_initial_secs: 1
//!   backoff_max_secs: 30
//! ```

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Config file used when `LIGHTSCRIPT_CONFIG` is not set
pub const DEFAULT_CONFIG_FILE: &str = "lightscript.yaml";

const ENV_CONFIG: &str = "LIGHTSCRIPT_CONFIG";
const ENV_DRIVER: &str = "LIGHTSCRIPT_DRIVER";
const ENV_BRIDGE: &str = "LIGHTSCRIPT_BRIDGE";
const ENV_USERNAME: &str = "LIGHTSCRIPT_USERNAME";

/// Which bulb driver to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    /// Philips Hue bridge
    #[default]
    Hue,
    /// In-memory bulb that only logs (dry run)
    Simulated,
}

impl FromStr for Driver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hue" => Ok(Self::Hue),
            "simulated" => Ok(Self::Simulated),
            other => Err(ConfigError::InvalidValue {
                key: "bulb.driver".to_string(),
                reason: format!("unknown driver '{}' (expected hue or simulated)", other),
            }),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hue => f.write_str("hue"),
            Self::Simulated => f.write_str("simulated"),
        }
    }
}

/// The `bulb:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulbConfig {
    #[serde(default)]
    pub driver: Driver,

    /// Hue bridge host, `host:port` or base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,

    /// Hue API username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// HTTP request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for BulbConfig {
    fn default() -> Self {
        Self {
            driver: Driver::default(),
            bridge: None,
            username: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BulbConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The `playback:` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// First wait after a connectivity failure
    #[serde(default = "default_backoff_initial_secs")]
    pub backoff_initial_secs: u64,

    /// Longest wait between reconnect attempts
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
}

fn default_backoff_initial_secs() -> u64 {
    1
}

fn default_backoff_max_secs() -> u64 {
    30
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            backoff_initial_secs: default_backoff_initial_secs(),
            backoff_max_secs: default_backoff_max_secs(),
        }
    }
}

impl PlaybackConfig {
    pub fn backoff_initial(&self) -> Duration {
        Duration::from_secs(self.backoff_initial_secs)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs)
    }
}

/// Complete player configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bulb: BulbConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl Config {
    /// Load configuration using the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration, resolving environment variables through `lookup`
    ///
    /// An explicitly named config file must exist; the default one is optional.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = match lookup(ENV_CONFIG) {
            Some(path) => Self::load_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.is_file() {
                    Self::load_file(path)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };

        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML config file without overrides or validation
    pub fn load_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading config file: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_yaml_str(&content, path)
    }

    /// Parse YAML config text; `source_path` is only used in errors
    pub fn from_yaml_str(content: &str, source_path: &Path) -> ConfigResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: PathBuf::from(source_path),
            source: e,
        })
    }

    /// Apply `LIGHTSCRIPT_*` overrides
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(driver) = lookup(ENV_DRIVER) {
            self.bulb.driver = driver.parse()?;
        }
        if let Some(bridge) = lookup(ENV_BRIDGE) {
            self.bulb.bridge = Some(bridge);
        }
        if let Some(username) = lookup(ENV_USERNAME) {
            self.bulb.username = Some(username);
        }
        Ok(())
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bulb.driver == Driver::Hue {
            if self.bulb.bridge.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::MissingValue {
                    key: "bulb.bridge".to_string(),
                    env: ENV_BRIDGE.to_string(),
                });
            }
            if self.bulb.username.as_deref().map_or(true, str::is_empty) {
                return Err(ConfigError::MissingValue {
                    key: "bulb.username".to_string(),
                    env: ENV_USERNAME.to_string(),
                });
            }
        }

        if self.bulb.timeout_secs == 0 {
            return Err(invalid("bulb.timeout_secs", "must be greater than 0"));
        }
        if self.playback.backoff_initial_secs == 0 {
            return Err(invalid(
                "playback.backoff_initial_secs",
                "must be greater than 0",
            ));
        }
        if self.playback.backoff_initial_secs > self.playback.backoff_max_secs {
            return Err(invalid(
                "playback.backoff_max_secs",
                "must not be less than backoff_initial_secs",
            ));
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
