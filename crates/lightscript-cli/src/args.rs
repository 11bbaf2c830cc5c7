//! Command-line arguments
//!
//! Two positionals and no flags: the script file and the bulb identifier.

use std::path::PathBuf;
use thiserror::Error;

/// Parsed command-line arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    /// Script file to play and re-read on reload
    pub script_path: PathBuf,
    /// Bulb to drive, as the bridge knows it
    pub bulb_id: String,
}

/// Wrong number of arguments
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Usage: {program} lightscript bulb_number")]
pub struct UsageError {
    program: String,
}

impl CliArgs {
    /// Parse from the process arguments
    pub fn parse() -> Result<Self, UsageError> {
        Self::parse_from(std::env::args())
    }

    /// Parse from an argument list whose first item is the program name
    pub fn parse_from<I, S>(args: I) -> Result<Self, UsageError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        let program = args.next().unwrap_or_else(|| "lightscript".to_string());
        let rest: Vec<String> = args.collect();

        match <[String; 2]>::try_from(rest) {
            Ok([script, bulb_id]) => Ok(Self {
                script_path: PathBuf::from(script),
                bulb_id,
            }),
            Err(_) => Err(UsageError { program }),
        }
    }
}
