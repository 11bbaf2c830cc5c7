//! Playback loop
//!
//! Plays the script pass after pass until shutdown is requested:
//!
//! 1. connect, log the starting colour, snapshot the bulb and switch it on
//! 2. at the start of each pass, pick up a reloaded script and reset the
//!    time adjustment
//! 3. for each command: stop if shutdown was requested, otherwise execute
//!    it and sleep for its delay
//! 4. restore the snapshot
//!
//! A connectivity failure drops the bulb handle, waits out the backoff,
//! reconnects and retries the same command. The backoff resets after every
//! successful command.

use crate::backoff::Backoff;
use crate::error::PlayerResult;
use crate::interpreter::{Dispatch, Interpreter};
use crate::state::{PlaybackControl, PlaybackState, Power};
use lightscript_bulb::{Bulb, BulbConnector, BulbError, BulbSnapshot};
use lightscript_core::{Command, Script};
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Wait between passes over an empty script
const EMPTY_SCRIPT_IDLE: Duration = Duration::from_secs(1);

/// Tries at restoring the bulb before giving up
const RESTORE_ATTEMPTS: u32 = 5;

/// Player settings
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// First wait after a connectivity failure
    pub backoff_initial: Duration,
    /// Longest wait between reconnect attempts
    pub backoff_max: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            backoff_initial: Duration::from_secs(1),
            backoff_max: Duration::from_secs(30),
        }
    }
}

/// Counters reported when playback ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    /// Passes started
    pub passes: u64,
    /// Commands executed
    pub commands: u64,
    /// Successful reconnects after a connectivity failure
    pub reconnects: u64,
}

/// Plays a script on one bulb
pub struct Player<C: BulbConnector, R = StdRng> {
    connector: C,
    control: Arc<PlaybackControl>,
    script: Arc<Script>,
    interpreter: Interpreter<R>,
    state: PlaybackState,
    backoff: Backoff,
    bulb: Option<C::Bulb>,
    summary: PlaybackSummary,
}

impl<C: BulbConnector> Player<C> {
    pub fn new(
        connector: C,
        script: Script,
        control: Arc<PlaybackControl>,
        config: PlayerConfig,
    ) -> Self {
        Self {
            connector,
            control,
            script: Arc::new(script),
            interpreter: Interpreter::new(),
            state: PlaybackState::new(),
            backoff: Backoff::new(config.backoff_initial, config.backoff_max),
            bulb: None,
            summary: PlaybackSummary::default(),
        }
    }
}

impl<C: BulbConnector, R: Rng + Send> Player<C, R> {
    /// Use a specific random source for jitter
    pub fn with_rng<R2: Rng + Send>(self, rng: R2) -> Player<C, R2> {
        Player {
            connector: self.connector,
            control: self.control,
            script: self.script,
            interpreter: Interpreter::with_rng(rng),
            state: self.state,
            backoff: self.backoff,
            bulb: self.bulb,
            summary: self.summary,
        }
    }

    /// Play until shutdown, then restore the bulb
    ///
    /// Fails if the bulb cannot be reached at startup, or on any error other
    /// than a connectivity failure. A restore is still attempted in the
    /// latter case.
    pub async fn run(mut self) -> PlayerResult<PlaybackSummary> {
        let mut bulb = self.connector.connect().await?;

        let initial = bulb.rgb().await?;
        info!(
            "Initial settings of bulb {}: rgb({}, {}, {})",
            self.connector.identifier(),
            initial.red,
            initial.green,
            initial.blue
        );

        let snapshot = bulb.save_snapshot().await?;
        bulb.turn_on().await?;
        self.state.power = Power::On;
        self.bulb = Some(bulb);

        if let Err(e) = self.play().await {
            error!("Playback failed: {}", e);
            if let Err(restore_err) = self.restore(&snapshot).await {
                warn!("Could not restore bulb settings: {}", restore_err);
            }
            return Err(e.into());
        }

        self.restore(&snapshot).await?;
        info!("Old bulb settings restored");

        debug!("Playback summary: {:?}", self.summary);
        Ok(self.summary)
    }

    async fn play(&mut self) -> Result<(), BulbError> {
        while !self.control.is_shutdown() {
            if let Some(script) = self.control.take_script() {
                info!("Switching to reloaded script ({} commands)", script.len());
                self.script = Arc::new(script);
            }

            self.state.time_adjust = 0;
            self.summary.passes += 1;

            if self.script.is_empty() {
                debug!("Script is empty, idling");
                tokio::time::sleep(EMPTY_SCRIPT_IDLE).await;
                continue;
            }

            let script = Arc::clone(&self.script);
            for command in script.iter() {
                if self.control.is_shutdown() {
                    debug!("Shutdown requested, abandoning pass");
                    break;
                }

                if let Dispatch::Sleep(duration) = self.dispatch(command).await? {
                    self.summary.commands += 1;
                    pace(duration).await;
                }
            }
        }

        Ok(())
    }

    /// Execute one command, reconnecting until it goes through
    async fn dispatch(&mut self, command: &Command) -> Result<Dispatch, BulbError> {
        loop {
            if self.bulb.is_none() {
                if self.control.is_shutdown() {
                    return Ok(Dispatch::Skip);
                }

                match self.connector.connect().await {
                    Ok(bulb) => {
                        info!("Reconnected to bulb {}", self.connector.identifier());
                        self.summary.reconnects += 1;
                        self.bulb = Some(bulb);
                    }
                    Err(e) if e.is_connectivity() => {
                        self.wait_before_retry(&e).await;
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            let Some(bulb) = self.bulb.as_mut() else {
                continue;
            };

            let result = self
                .interpreter
                .execute(command, bulb, &mut self.state, &self.control)
                .await;

            match result {
                Ok(dispatch) => {
                    self.backoff.reset();
                    return Ok(dispatch);
                }
                Err(e) if e.is_connectivity() => {
                    self.bulb = None;
                    self.wait_before_retry(&e).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn wait_before_retry(&mut self, e: &BulbError) {
        let delay = self.backoff.next_delay();
        warn!(
            "Error connecting: {}. Will retry in {} seconds.",
            e,
            delay.as_secs_f64()
        );
        tokio::time::sleep(delay).await;
    }

    /// Put the bulb back the way it was found
    ///
    /// Connectivity failures are retried with the same backoff as playback,
    /// up to [`RESTORE_ATTEMPTS`] tries.
    async fn restore(&mut self, snapshot: &BulbSnapshot) -> Result<(), BulbError> {
        let mut attempt = 1;
        loop {
            let result = self.try_restore(snapshot).await;
            match result {
                Ok(()) => return Ok(()),
                Err(e) if e.is_connectivity() && attempt < RESTORE_ATTEMPTS => {
                    self.bulb = None;
                    attempt += 1;
                    self.wait_before_retry(&e).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_restore(&mut self, snapshot: &BulbSnapshot) -> Result<(), BulbError> {
        if self.bulb.is_none() {
            let bulb = self.connector.connect().await?;
            info!("Reconnected to bulb {}", self.connector.identifier());
            self.summary.reconnects += 1;
            self.bulb = Some(bulb);
        }

        match self.bulb.as_mut() {
            Some(bulb) => bulb.restore_snapshot(snapshot).await,
            None => Ok(()),
        }
    }
}

/// Sleep between commands; a zero wait still yields to other tasks
async fn pace(duration: Duration) {
    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(duration).await;
    }
}
