//! Command sequences ("paths") that reach oracle states.

use std::fmt;

use anyhow::{Result, bail};

/// Delimiter used to encode paths on the verification input stream.
pub const WIRE_DELIMITER: char = '|';

/// An ordered sequence of commands; doubles as a replay script.
///
/// The empty path is the oracle's start state. Paths never mutate in place:
/// [`CommandPath::child`] returns an extended copy, so a path stored in the
/// visited map stays the path that discovered its state.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct CommandPath {
    commands: Vec<String>,
}

impl CommandPath {
    /// The empty path (start state).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a path from a command list, rejecting commands with embedded
    /// newlines (the bridge appends the terminating newline itself).
    pub fn from_commands<I, S>(commands: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let commands: Vec<String> = commands.into_iter().map(Into::into).collect();
        for command in &commands {
            if command.is_empty() {
                bail!("empty command in path");
            }
            if command.contains('\n') {
                bail!("command contains embedded newline: {command:?}");
            }
        }
        Ok(Self { commands })
    }

    /// Return a copy of this path extended by one command.
    pub fn child(&self, command: &str) -> Self {
        let mut commands = self.commands.clone();
        commands.push(command.to_string());
        Self { commands }
    }

    /// Number of commands in the path.
    pub fn depth(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Split into (setup, final command) for replay verification.
    ///
    /// Returns `None` for the empty path.
    pub fn split_last(&self) -> Option<(CommandPath, &str)> {
        let (last, setup) = self.commands.split_last()?;
        Some((
            CommandPath {
                commands: setup.to_vec(),
            },
            last.as_str(),
        ))
    }

    /// Parse a pipe-delimited path line from the verification input stream.
    pub fn parse_wire(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            bail!("empty path in verification record");
        }
        Self::from_commands(line.split(WIRE_DELIMITER).map(str::to_string))
    }

    /// Render the path in the pipe-delimited wire encoding.
    pub fn render_wire(&self) -> String {
        self.commands.join(&WIRE_DELIMITER.to_string())
    }
}

impl fmt::Display for CommandPath {
    /// Human-readable rendering: commands joined with `;`, `(start)` for the
    /// empty path.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.commands.is_empty() {
            return write!(f, "(start)");
        }
        write!(f, "{}", self.commands.join(";"))
    }
}
