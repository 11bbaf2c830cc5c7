//! Lightscript player
//!
//! Plays a [`Script`](lightscript_core::Script) against one bulb, forever,
//! until asked to stop.
//!
//! # Components
//!
//! - [`jitter`] - Bounded random perturbation of a channel value
//! - [`PlaybackState`] / [`PlaybackControl`] - Per-pass state and the
//!   flags shared with signal handlers
//! - [`Interpreter`] - Applies one command to the bulb
//! - [`Player`] - Paces passes over the script, retries on connectivity loss
//! - [`SignalManager`] - Turns process signals into shutdown and reload requests

mod backoff;
mod error;
mod interpreter;
mod jitter;
mod player;
mod signals;
mod state;

pub use backoff::Backoff;
pub use error::{PlayerError, PlayerResult};
pub use interpreter::{sleep_duration, Dispatch, Interpreter};
pub use jitter::jitter;
pub use player::{PlaybackSummary, Player, PlayerConfig};
pub use signals::{ControlSignal, SignalManager};
pub use state::{PlaybackControl, PlaybackState, Power};
