//! Command definitions
//!
//! A command is a verb plus positional arguments. A [`CommandSpec`] is the
//! operator's textual form of a command, optionally naming an attachment file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{EmuNwError, Result};

/// Separator between arguments on the wire and in command specs
pub const ARG_SEPARATOR: char = ';';

/// Marker introducing an attachment path in a command spec
pub const ATTACHMENT_MARKER: char = '@';

/// A command verb and its arguments, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: String,
    args: Vec<String>,
}

impl Command {
    /// Create a command. Validation happens when the command is encoded.
    pub fn new<I, S>(verb: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            verb: verb.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// A command without arguments
    pub fn bare(verb: impl Into<String>) -> Self {
        Self::new(verb, Vec::<String>::new())
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Check the verb and arguments can be placed on a single command line
    pub fn validate(&self) -> Result<()> {
        if self.verb.is_empty() {
            return Err(EmuNwError::Protocol("command verb is empty".to_string()));
        }
        if self.verb.chars().any(|c| c == ' ' || c.is_control()) {
            return Err(EmuNwError::Protocol(format!(
                "command verb {:?} contains a space or control character",
                self.verb
            )));
        }
        // ';' inside an argument is passed through unescaped
        if let Some(arg) = self.args.iter().find(|a| a.contains('\n')) {
            return Err(EmuNwError::Protocol(format!(
                "argument {:?} of {} contains a newline",
                arg, self.verb
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.verb)?;
        if !self.args.is_empty() {
            write!(f, " {}", self.args.join(";"))?;
        }
        Ok(())
    }
}

/// One entry of the operator's command list: `verb[;arg;arg...][@path]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: Command,

    /// File whose contents become the frame's attachment
    pub attachment: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(command: Command, attachment: Option<PathBuf>) -> Self {
        Self {
            command,
            attachment,
        }
    }

    /// Attach a file to a spec that does not already name one
    pub fn attach(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if let Some(existing) = &self.attachment {
            return Err(EmuNwError::Config(format!(
                "{} already has attachment {}, cannot also attach {}",
                self.command.verb(),
                existing.display(),
                path.display()
            )));
        }
        self.attachment = Some(path);
        Ok(())
    }
}

impl FromStr for CommandSpec {
    type Err = EmuNwError;

    fn from_str(s: &str) -> Result<Self> {
        // The path is whatever follows the last '@'; an empty path means none
        let (text, attachment) = match s.rsplit_once(ATTACHMENT_MARKER) {
            Some((text, path)) if !path.is_empty() => (text, Some(PathBuf::from(path))),
            Some((text, _)) => (text, None),
            None => (s, None),
        };

        let mut parts = text.split(ARG_SEPARATOR);
        let verb = parts.next().unwrap_or_default();
        if verb.is_empty() {
            return Err(EmuNwError::Protocol(format!(
                "command spec {:?} has no verb",
                s
            )));
        }

        Ok(Self {
            command: Command::new(verb, parts),
            attachment,
        })
    }
}
