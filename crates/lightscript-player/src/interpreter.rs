//! Command interpreter
//!
//! Applies one [`Command`] to a bulb and works out how long to wait before
//! the next one. The interpreter never sleeps itself; pacing belongs to the
//! playback loop.

use crate::jitter::jitter;
use crate::state::{PlaybackControl, PlaybackState, Power};
use lightscript_bulb::{Bulb, BulbResult, Hsb, Rgb, HUE_MAX};
use lightscript_core::{Command, Instruction, TICKS_PER_SECOND};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, trace};

/// Largest saturation, brightness and RGB channel value
const LEVEL_MAX: i64 = 255;

/// What the playback loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Wait this long before the next command
    Sleep(Duration),
    /// Shutdown was requested; nothing was done and nothing should be waited
    Skip,
}

/// Real time to wait for `delay` ticks plus the running adjustment
///
/// A negative total waits zero.
pub fn sleep_duration(delay: u32, time_adjust: i64) -> Duration {
    let ticks = i64::from(delay).saturating_add(time_adjust);
    if ticks <= 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(ticks as f64 / TICKS_PER_SECOND)
}

/// Executes commands against a bulb
pub struct Interpreter<R = StdRng> {
    rng: R,
}

impl Interpreter<StdRng> {
    /// Create an interpreter seeded from system entropy
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for Interpreter<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng + Send> Interpreter<R> {
    /// Create an interpreter with a specific random source
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Execute one command
    ///
    /// Once shutdown has been requested this touches nothing and returns
    /// [`Dispatch::Skip`].
    pub async fn execute<B: Bulb + ?Sized>(
        &mut self,
        command: &Command,
        bulb: &mut B,
        state: &mut PlaybackState,
        control: &PlaybackControl,
    ) -> BulbResult<Dispatch> {
        if control.is_shutdown() {
            return Ok(Dispatch::Skip);
        }

        trace!(
            "Executing {} {:?} (delay {})",
            command.instruction,
            command.params,
            command.delay
        );

        match &command.instruction {
            Instruction::Fade => {
                let speed = command.param(0);
                let steps = LEVEL_MAX.saturating_sub(speed).max(0);
                let seconds = steps as f64 / (TICKS_PER_SECOND * 10.0);
                bulb.set_transition_time(seconds).await?;
            }

            Instruction::TimeAdjust => state.adjust_time(command.param(0)),

            Instruction::Hsb => {
                let (hue, sat, bri) = (command.param(0), command.param(1), command.param(2));
                if bri == 0 {
                    power_off(bulb, state).await?;
                } else {
                    power_on(bulb, state).await?;
                    let hue = hue.saturating_mul(i64::from(HUE_MAX)) / LEVEL_MAX;
                    bulb.set_hsb(Hsb::new(to_hue(hue), to_level(sat), to_level(bri)))
                        .await?;
                }
            }

            Instruction::HsbJitter => {
                let hue_variance =
                    command.param(0).saturating_mul(i64::from(HUE_MAX)) / LEVEL_MAX;
                let hue = i64::from(bulb.hue().await?);
                let sat = i64::from(bulb.saturation().await?);
                let bri = i64::from(bulb.brightness().await?);

                let hsb = Hsb::new(
                    to_hue(jitter(&mut self.rng, hue, i64::from(HUE_MAX), hue_variance)),
                    to_level(jitter(&mut self.rng, sat, LEVEL_MAX, command.param(1))),
                    to_level(jitter(&mut self.rng, bri, LEVEL_MAX, command.param(2))),
                );
                bulb.set_hsb(hsb).await?;
            }

            Instruction::Rgb => {
                let (r, g, b) = (command.param(0), command.param(1), command.param(2));
                if r == 0 && g == 0 && b == 0 {
                    power_off(bulb, state).await?;
                } else {
                    power_on(bulb, state).await?;
                    bulb.set_rgb(Rgb::new(to_level(r), to_level(g), to_level(b)))
                        .await?;
                }
            }

            Instruction::RgbJitter => {
                let current = bulb.rgb().await?;
                let rgb = Rgb::new(
                    self.jitter_level(current.red, command.param(0)),
                    self.jitter_level(current.green, command.param(1)),
                    self.jitter_level(current.blue, command.param(2)),
                );
                bulb.set_rgb(rgb).await?;
            }

            Instruction::Unknown(code) => {
                debug!("Ignoring unknown instruction '{}'", code);
            }
        }

        Ok(Dispatch::Sleep(sleep_duration(
            command.delay,
            state.time_adjust,
        )))
    }

    fn jitter_level(&mut self, value: u8, variance: i64) -> u8 {
        to_level(jitter(&mut self.rng, i64::from(value), LEVEL_MAX, variance))
    }
}

async fn power_on<B: Bulb + ?Sized>(bulb: &mut B, state: &mut PlaybackState) -> BulbResult<()> {
    if !state.power.is_on() {
        bulb.turn_on().await?;
        state.power = Power::On;
    }
    Ok(())
}

async fn power_off<B: Bulb + ?Sized>(bulb: &mut B, state: &mut PlaybackState) -> BulbResult<()> {
    if state.power.is_on() {
        bulb.turn_off().await?;
        state.power = Power::Off;
    }
    Ok(())
}

fn to_level(value: i64) -> u8 {
    value.clamp(0, LEVEL_MAX) as u8
}

fn to_hue(value: i64) -> u16 {
    value.clamp(0, i64::from(HUE_MAX)) as u16
}
