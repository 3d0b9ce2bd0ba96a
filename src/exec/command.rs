// src/exec/command.rs

//! The command line run inside every affected project.

use std::fmt;
use std::path::Path;

use tokio::process::Command;

/// A program plus its arguments, executed directly (no shell).
///
/// An empty command is representable; it is reported per project as
/// an invalid command rather than failing the whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    tokens: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Split into program and arguments; `None` when there is no program.
    pub fn split(&self) -> Option<(&str, &[String])> {
        self.tokens
            .split_first()
            .map(|(program, args)| (program.as_str(), args))
    }

    /// Build a `tokio` command running in `dir`, or `None` when there is no program.
    ///
    /// On unix the process leads a new process group, so it can be killed
    /// together with everything it spawned.
    pub(crate) fn to_command(&self, dir: &Path) -> Option<Command> {
        let (program, args) = self.split()?;
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(dir).kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        Some(cmd)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

impl From<Vec<String>> for CommandSpec {
    fn from(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}
