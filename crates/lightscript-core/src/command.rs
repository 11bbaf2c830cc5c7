//! Command definitions
//!
//! A command is one `[delay, [code, param...]]` tuple from a script.

use crate::error::{ParseError, ParseResult};
use serde_json::Value;
use std::fmt;

/// Instruction codes understood by the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `f [speed]` - set the transition duration
    Fade,
    /// `t [delta]` - adjust (or reset with 0) the global time offset
    TimeAdjust,
    /// `h [hue, sat, bri]` - set hue/saturation/brightness, bri 0 turns off
    Hsb,
    /// `H [hueVar, satVar, briVar]` - randomize hue/saturation/brightness
    HsbJitter,
    /// `c [r, g, b]` - set colour, all zero turns off
    Rgb,
    /// `C [rVar, gVar, bVar]` - randomize colour channels
    RgbJitter,
    /// Any other code; executed as a no-op
    Unknown(String),
}

impl Instruction {
    /// Map a script code to an instruction
    pub fn from_code(code: &str) -> Self {
        match code {
            "f" => Self::Fade,
            "t" => Self::TimeAdjust,
            "h" => Self::Hsb,
            "H" => Self::HsbJitter,
            "c" => Self::Rgb,
            "C" => Self::RgbJitter,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The script code for this instruction
    pub fn code(&self) -> &str {
        match self {
            Self::Fade => "f",
            Self::TimeAdjust => "t",
            Self::Hsb => "h",
            Self::HsbJitter => "H",
            Self::Rgb => "c",
            Self::RgbJitter => "C",
            Self::Unknown(code) => code,
        }
    }

    /// Number of parameters the instruction reads
    pub fn arity(&self) -> usize {
        match self {
            Self::Fade | Self::TimeAdjust => 1,
            Self::Hsb | Self::HsbJitter | Self::Rgb | Self::RgbJitter => 3,
            Self::Unknown(_) => 0,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single timed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Ticks to wait after the command has been applied
    pub delay: u32,
    /// What to do
    pub instruction: Instruction,
    /// Instruction parameters, in script order
    pub params: Vec<i64>,
}

impl Command {
    /// Create a command
    pub fn new(delay: u32, instruction: Instruction, params: Vec<i64>) -> Self {
        Self {
            delay,
            instruction,
            params,
        }
    }

    /// Get the parameter at `index`
    ///
    /// Parsed commands always carry at least [`Instruction::arity`] parameters,
    /// so missing values only occur for hand-built commands and read as 0.
    pub fn param(&self, index: usize) -> i64 {
        self.params.get(index).copied().unwrap_or(0)
    }

    /// Build a command from one parsed top-level element
    pub(crate) fn from_value(index: usize, value: &Value) -> ParseResult<Self> {
        let tuple = value
            .as_array()
            .ok_or_else(|| ParseError::invalid(index, "expected [delay, [code, ...]]"))?;

        let [delay, data] = tuple.as_slice() else {
            return Err(ParseError::invalid(
                index,
                format!("expected 2 elements, found {}", tuple.len()),
            ));
        };

        let delay = delay
            .as_u64()
            .and_then(|d| u32::try_from(d).ok())
            .ok_or_else(|| ParseError::invalid(index, format!("invalid delay: {}", delay)))?;

        let data = data
            .as_array()
            .ok_or_else(|| ParseError::invalid(index, "instruction must be a list"))?;

        let (code, params) = data
            .split_first()
            .ok_or_else(|| ParseError::invalid(index, "empty instruction"))?;

        let code = code
            .as_str()
            .ok_or_else(|| ParseError::invalid(index, format!("invalid code: {}", code)))?;
        let instruction = Instruction::from_code(code);

        let params = params
            .iter()
            .map(|p| {
                p.as_i64().ok_or_else(|| {
                    ParseError::invalid(index, format!("parameter {} is not an integer", p))
                })
            })
            .collect::<ParseResult<Vec<_>>>()?;

        if params.len() < instruction.arity() {
            return Err(ParseError::invalid(
                index,
                format!(
                    "'{}' takes {} parameters, found {}",
                    instruction,
                    instruction.arity(),
                    params.len()
                ),
            ));
        }

        Ok(Self::new(delay, instruction, params))
    }
}
