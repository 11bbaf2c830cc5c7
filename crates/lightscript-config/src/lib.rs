//! Configuration loading for the lightscript player
//!
//! Configuration comes from an optional YAML file, then environment
//! variable overrides:
//!
//! - `LIGHTSCRIPT_CONFIG` - path of the YAML file (default `lightscript.yaml`)
//! - `LIGHTSCRIPT_DRIVER` - bulb driver (`hue` or `simulated`)
//! - `LIGHTSCRIPT_BRIDGE` - Hue bridge address
//! - `LIGHTSCRIPT_USERNAME` - Hue API username
//!
//! # Example
//!
//! ```ignore
//! use lightscript_config::Config;
//!
//! let config = Config::from_env()?;
//! println!("driver: {}", config.bulb.driver);
//! ```

mod config;
mod error;

pub use config::{BulbConfig, Config, Driver, PlaybackConfig, DEFAULT_CONFIG_FILE};
pub use error::{ConfigError, ConfigResult};
