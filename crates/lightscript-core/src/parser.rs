//! Script text normalization and parsing
//!
//! The lightscript format is JSON with a few conveniences. Parsing rewrites
//! the text into strict JSON in a fixed order and then decodes it:
//!
//! 1. wrap the body as the value of a `"data"` array field
//! 2. drop the last comma in the text (the trailing separator)
//! 3. replace `0xNN` hex literals with their decimal value
//! 4. strip `//` line comments
//! 5. turn single quotes into double quotes
//! 6. turn `{}` into `[]`
//! 7. wrap in an object and decode as JSON
//!
//! The order matters: a comment is still present when the last comma is
//! removed, so a comma inside a trailing comment is the one that goes.

use crate::command::Command;
use crate::error::{ParseError, ParseResult};
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Field the script body is wrapped into
const DATA_FIELD: &str = "data";

static HEX_LITERAL: OnceLock<Regex> = OnceLock::new();
static LINE_COMMENT: OnceLock<Regex> = OnceLock::new();

fn hex_literal() -> &'static Regex {
    HEX_LITERAL.get_or_init(|| Regex::new(r"0x([0-9A-Fa-f]{2})").expect("hex literal pattern"))
}

fn line_comment() -> &'static Regex {
    LINE_COMMENT.get_or_init(|| Regex::new(r"(?m)//.*$").expect("line comment pattern"))
}

/// Rewrite raw script text into a strict JSON document
///
/// The result is an object with a single `"data"` field holding the command
/// tuples. No validation happens here.
pub fn normalize(raw: &str) -> String {
    let mut text = format!("\"{}\": [ {} ]", DATA_FIELD, raw);

    if let Some(pos) = text.rfind(',') {
        text.remove(pos);
    }

    let text = hex_literal().replace_all(&text, |caps: &Captures| {
        // Two hex digits always fit in a u8
        u8::from_str_radix(&caps[1], 16)
            .map(|v| v.to_string())
            .unwrap_or_else(|_| caps[0].to_string())
    });
    let text = line_comment().replace_all(&text, "");

    let text: String = text
        .chars()
        .map(|c| match c {
            '\'' => '"',
            '{' => '[',
            '}' => ']',
            other => other,
        })
        .collect();

    format!("{{ {} }}", text)
}

/// Parse raw script text into commands
pub fn parse_commands(raw: &str) -> ParseResult<Vec<Command>> {
    let json = normalize(raw);
    trace!("Normalized script: {}", json);

    let document: Value = serde_json::from_str(&json)?;
    let elements = document
        .get(DATA_FIELD)
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::invalid(0, "script body is not a list of commands"))?;

    let commands = elements
        .iter()
        .enumerate()
        .map(|(index, value)| Command::from_value(index, value))
        .collect::<ParseResult<Vec<_>>>()?;

    debug!("Parsed {} commands", commands.len());
    Ok(commands)
}
