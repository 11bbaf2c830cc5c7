//! Core types for lightscript playback
//!
//! A lightscript is a compact, comment-friendly text file describing a timed
//! lighting sequence for a single bulb. This crate turns that text into a
//! strict list of [`Command`]s.
//!
//! # Script format
//!
//! The file body is a comma-separated list of `[delay, [code, param...]]`
//! tuples, where `delay` is measured in ticks (1/30 s). The parser tolerates:
//!
//! - a trailing comma after the last tuple
//! - `//` line comments
//! - two-digit hex literals such as `0xff`
//! - single-quoted instruction codes
//! - `{}` used in place of `[]`
//!
//! # Key Types
//!
//! - [`Script`] - An ordered, restartable command sequence
//! - [`Command`] - One timed instruction
//! - [`Instruction`] - The instruction codes the player understands

mod command;
mod error;
mod parser;
mod script;

pub use command::{Command, Instruction};
pub use error::{ParseError, ParseResult};
pub use parser::{normalize, parse_commands};
pub use script::Script;

/// Script time unit: number of ticks in one second
pub const TICKS_PER_SECOND: f64 = 30.0;
