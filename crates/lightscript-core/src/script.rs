//! Script definition
//!
//! A Script is the ordered command list played by the player. It is
//! immutable; reloading produces a new Script that replaces the old one.

use crate::command::Command;
use crate::error::{ParseError, ParseResult};
use crate::parser::parse_commands;
use std::fs;
use std::path::Path;
use tracing::debug;

/// A parsed lightscript
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    commands: Vec<Command>,
}

impl Script {
    /// Create from already-built commands
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    /// Parse script text
    pub fn parse(raw: &str) -> ParseResult<Self> {
        parse_commands(raw).map(Self::new)
    }

    /// Read and parse a script file
    pub fn load(path: impl AsRef<Path>) -> ParseResult<Self> {
        let path = path.as_ref();
        debug!("Loading script: {:?}", path);

        let raw = fs::read_to_string(path).map_err(|e| ParseError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&raw)
    }

    /// Commands in play order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the script has no commands
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate commands in play order
    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    /// Length of one pass in ticks, ignoring time adjustments
    pub fn total_ticks(&self) -> u64 {
        self.commands.iter().map(|c| u64::from(c.delay)).sum()
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Instruction;
    use std::io::Write;

    const SAMPLE: &str = "\
// red, then dark
{10, {'c', 0xff, 0, 0}},
{20, {'c', 0, 0, 0}},
";

    #[test]
    fn test_parse_sample() {
        let script = Script::parse(SAMPLE).unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(
            script.commands()[0],
            Command::new(10, Instruction::Rgb, vec![255, 0, 0])
        );
        assert_eq!(script.total_ticks(), 30);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let script = Script::load(file.path()).unwrap();
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Script::load(dir.path().join("missing.ls")).unwrap_err();
        assert!(matches!(err, ParseError::ReadFile { .. }));
    }

    #[test]
    fn test_iterate() {
        let script = Script::parse(SAMPLE).unwrap();
        let delays: Vec<u32> = script.iter().map(|c| c.delay).collect();
        assert_eq!(delays, vec![10, 20]);
        assert_eq!((&script).into_iter().count(), 2);
    }
}
