use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::input::key_name::normalize_key;

/// Leading marker that flags a conf line as an application command rather
/// than an engine command.
pub const APP_COMMAND_MARKER: &str = "#@reel";

/// Command that consumes a key without doing anything.
pub const IGNORE_COMMAND: &str = "ignore";

/// One key to command entry.
///
/// `normalized_key` and `command_tokens` are derived from `raw_key` and
/// `raw_command` and are recomputed by every setter, so they can never go
/// stale relative to the authored text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "KeyMappingWire", into = "KeyMappingWire")]
pub struct KeyMapping {
    raw_key: String,
    normalized_key: String,
    is_app_command: bool,
    raw_command: String,
    command_tokens: Vec<String>,
    comment: Option<String>,
}

/// Transfer shape: only authored fields travel, derived ones are rebuilt.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyMappingWire {
    raw_key: String,
    raw_command: String,
    #[serde(default)]
    is_app_command: bool,
    #[serde(default)]
    comment: Option<String>,
}

impl From<KeyMappingWire> for KeyMapping {
    fn from(wire: KeyMappingWire) -> Self {
        KeyMapping::new(
            wire.raw_key,
            wire.raw_command,
            wire.is_app_command,
            wire.comment,
        )
    }
}

impl From<KeyMapping> for KeyMappingWire {
    fn from(mapping: KeyMapping) -> Self {
        KeyMappingWire {
            raw_key: mapping.raw_key,
            raw_command: mapping.raw_command,
            is_app_command: mapping.is_app_command,
            comment: mapping.comment,
        }
    }
}

fn tokenize(raw_command: &str) -> Vec<String> {
    raw_command.split_whitespace().map(str::to_string).collect()
}

impl KeyMapping {
    pub fn new(
        raw_key: impl Into<String>,
        raw_command: impl Into<String>,
        is_app_command: bool,
        comment: Option<String>,
    ) -> Self {
        let raw_key = raw_key.into();
        let raw_command = raw_command.into();
        Self {
            normalized_key: normalize_key(&raw_key),
            command_tokens: tokenize(&raw_command),
            raw_key,
            is_app_command,
            raw_command,
            comment: comment.filter(|c| !c.is_empty()),
        }
    }

    /// Engine command with no comment.
    pub fn engine(raw_key: impl Into<String>, raw_command: impl Into<String>) -> Self {
        Self::new(raw_key, raw_command, false, None)
    }

    /// Synthesized `ignore` record, used while a sequence is still in
    /// progress.
    pub fn ignore(raw_key: impl Into<String>) -> Self {
        Self::engine(raw_key, IGNORE_COMMAND)
    }

    pub fn raw_key(&self) -> &str {
        &self.raw_key
    }

    pub fn normalized_key(&self) -> &str {
        &self.normalized_key
    }

    pub fn is_app_command(&self) -> bool {
        self.is_app_command
    }

    pub fn raw_command(&self) -> &str {
        &self.raw_command
    }

    pub fn command_tokens(&self) -> &[String] {
        &self.command_tokens
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_raw_key(&mut self, raw_key: impl Into<String>) {
        self.raw_key = raw_key.into();
        self.normalized_key = normalize_key(&self.raw_key);
    }

    pub fn set_raw_command(&mut self, raw_command: impl Into<String>) {
        self.raw_command = raw_command.into();
        self.command_tokens = tokenize(&self.raw_command);
    }

    pub fn set_app_command(&mut self, is_app_command: bool) {
        self.is_app_command = is_app_command;
    }

    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment.filter(|c| !c.is_empty());
    }

    pub fn is_ignored(&self) -> bool {
        matches!(self.command_tokens.as_slice(), [only] if only == IGNORE_COMMAND)
    }

    /// Command with single spacing, prefixed with the marker for app commands.
    pub fn readable_command(&self) -> String {
        let joined = self.command_tokens.join(" ");
        if self.is_app_command {
            format!("{APP_COMMAND_MARKER} {joined}")
        } else {
            joined
        }
    }

    /// Section named by a leading `{section}` token, if any.
    pub fn destination_section(&self) -> Option<&str> {
        let first = self.command_tokens.first()?;
        first
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
    }

    /// Copy of this record with the `{section}` token removed.
    pub fn without_destination_section(&self) -> KeyMapping {
        if self.destination_section().is_none() {
            return self.clone();
        }
        let mut stripped = self.clone();
        stripped.set_raw_command(self.command_tokens[1..].join(" "));
        stripped
    }

    /// The record as a single `input.conf` line.
    pub fn conf_file_format(&self) -> String {
        let mut line = String::new();
        if self.is_app_command {
            line.push_str(APP_COMMAND_MARKER);
            line.push(' ');
        }
        line.push_str(&self.raw_key);
        line.push(' ');
        line.push_str(&self.raw_command);
        if let Some(comment) = &self.comment {
            line.push_str("   #");
            line.push_str(comment);
        }
        line
    }
}

impl fmt::Display for KeyMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.conf_file_format())
    }
}
