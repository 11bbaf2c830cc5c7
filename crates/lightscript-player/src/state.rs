//! Playback state
//!
//! [`PlaybackState`] is owned by the playback loop and only touched between
//! commands. [`PlaybackControl`] is shared with the signal handlers, which
//! may write to it at any time.

use lightscript_core::Script;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// Logical power state of the bulb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Power {
    On,
    #[default]
    Off,
}

impl Power {
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

/// Mutable state carried from one command to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackState {
    /// What the bulb was last told; on/off is only sent when this changes
    pub power: Power,
    /// Ticks added to every command delay; reset at the start of each pass
    pub time_adjust: i64,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a `t` instruction: 0 resets, anything else accumulates
    pub fn adjust_time(&mut self, delta: i64) {
        self.time_adjust = if delta == 0 {
            0
        } else {
            self.time_adjust.saturating_add(delta)
        };
    }
}

/// Shutdown flag and pending reload, shared with signal handlers
#[derive(Debug, Default)]
pub struct PlaybackControl {
    shutdown: AtomicBool,
    pending_script: Mutex<Option<Script>>,
}

impl PlaybackControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask playback to stop at the next command boundary
    ///
    /// Returns `true` the first time it is called.
    pub fn request_shutdown(&self) -> bool {
        !self.shutdown.swap(true, Ordering::SeqCst)
    }

    /// Whether shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Queue a script to replace the current one at the next pass
    ///
    /// Only the latest submission is kept.
    pub fn submit_script(&self, script: Script) {
        *self.slot() = Some(script);
    }

    /// Take the queued script, if any
    pub fn take_script(&self) -> Option<Script> {
        self.slot().take()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Script>> {
        self.pending_script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
