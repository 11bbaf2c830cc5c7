//! Player error types

use lightscript_bulb::BulbError;
use thiserror::Error;

/// Result type for playback
pub type PlayerResult<T> = Result<T, PlayerError>;

/// Errors that end playback
#[derive(Debug, Error)]
pub enum PlayerError {
    /// A bulb failure that retrying cannot fix
    #[error("bulb error: {0}")]
    Bulb(#[from] BulbError),
}
