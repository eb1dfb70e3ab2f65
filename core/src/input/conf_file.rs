//! Reading and writing `input.conf` text.
//!
//! Line format: `[#@reel] key command... [#comment]`.

use std::io;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::input::mapping::APP_COMMAND_MARKER;
use crate::input::mapping::KeyMapping;

const GENERATED_HEADER: &str = "# Generated by reel";

#[derive(Debug, Error)]
pub enum ConfFileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} has {lines} lines, more than the limit of {max}", path.display())]
    TooManyLines {
        path: PathBuf,
        lines: usize,
        max: usize,
    },
}

/// Splits `text` at the first `#` not preceded by a backslash.
fn split_comment(text: &str) -> (&str, Option<String>) {
    let mut escaped = false;
    for (idx, ch) in text.char_indices() {
        match ch {
            '\\' if !escaped => escaped = true,
            '#' if !escaped => {
                let comment = text[idx + 1..].trim();
                let comment = (!comment.is_empty()).then(|| comment.to_string());
                return (&text[..idx], comment);
            }
            _ => escaped = false,
        }
    }
    (text, None)
}

/// Parses one line. Blank lines, comment lines and lines without both a key
/// and a command yield `None`.
pub fn parse_raw_line(line: &str) -> Option<KeyMapping> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (is_app_command, rest) = match trimmed.strip_prefix(APP_COMMAND_MARKER) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
            (true, rest.trim_start())
        }
        _ if trimmed.starts_with('#') => return None,
        _ => (false, trimmed),
    };

    let (body, comment) = split_comment(rest);
    let (key, command) = body.trim().split_once(char::is_whitespace)?;
    let command = command.trim();
    if key.is_empty() || command.is_empty() {
        return None;
    }
    Some(KeyMapping::new(key, command, is_app_command, comment))
}

pub fn parse_conf_text(text: &str) -> Vec<KeyMapping> {
    text.lines().filter_map(parse_raw_line).collect()
}

/// Parses pasted text. Text longer than `max_lines` is rejected as a whole.
pub fn parse_clipboard_text(text: &str, max_lines: usize) -> Vec<KeyMapping> {
    let lines = text.lines().count();
    if lines > max_lines {
        warn!("Ignoring pasted text with {lines} lines (limit {max_lines})");
        return Vec::new();
    }
    parse_conf_text(text)
}

pub fn load_conf_file(path: &Path, max_lines: usize) -> Result<Vec<KeyMapping>, ConfFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let lines = text.lines().count();
    if lines > max_lines {
        return Err(ConfFileError::TooManyLines {
            path: path.to_path_buf(),
            lines,
            max: max_lines,
        });
    }
    let mappings = parse_conf_text(&text);
    debug!(
        "Loaded {} bindings from {} ({lines} lines)",
        mappings.len(),
        path.display()
    );
    Ok(mappings)
}

/// Serializes mappings as conf lines under a generated header. Records that
/// would not parse back to themselves are dropped.
pub fn to_conf_lines(mappings: &[KeyMapping]) -> Vec<String> {
    let mut lines = Vec::with_capacity(mappings.len() + 1);
    lines.push(GENERATED_HEADER.to_string());
    for mapping in mappings {
        let line = mapping.conf_file_format();
        if parse_raw_line(&line).is_some() {
            lines.push(line);
        } else {
            warn!("Skipping binding that cannot be written back: {line:?}");
        }
    }
    lines
}

pub fn save_conf_file(path: &Path, mappings: &[KeyMapping]) -> Result<(), ConfFileError> {
    let mut text = to_conf_lines(mappings).join("\n");
    text.push('\n');
    std::fs::write(path, text).map_err(|source| ConfFileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(parse_raw_line(""), None);
        assert_eq!(parse_raw_line("   \t "), None);
        assert_eq!(parse_raw_line("# a comment"), None);
        assert_eq!(parse_raw_line("#@reelish not-a-marker"), None);
    }

    #[test]
    fn requires_key_and_command() {
        assert_eq!(parse_raw_line("q"), None);
        assert_eq!(parse_raw_line("q   # only a comment"), None);
        assert_eq!(parse_raw_line("#@reel q"), None);
    }

    #[test]
    fn parses_engine_line_with_comment() {
        let mapping = parse_raw_line("  RIGHT  seek  5   # forward ").expect("line parses");
        assert_eq!(mapping.raw_key(), "RIGHT");
        assert_eq!(mapping.raw_command(), "seek  5");
        assert_eq!(mapping.command_tokens(), ["seek", "5"]);
        assert!(!mapping.is_app_command());
        assert_eq!(mapping.comment(), Some("forward"));
    }

    #[test]
    fn parses_app_command_marker() {
        let mapping = parse_raw_line("#@reel Meta+, preferences").expect("line parses");
        assert!(mapping.is_app_command());
        assert_eq!(mapping.raw_key(), "Meta+,");
        assert_eq!(mapping.raw_command(), "preferences");
    }

    #[test]
    fn escaped_hash_stays_in_command() {
        let mapping = parse_raw_line(r"x show-text \#1 # note").expect("line parses");
        assert_eq!(mapping.raw_command(), r"show-text \#1");
        assert_eq!(mapping.comment(), Some("note"));
    }

    #[test]
    fn serialized_line_parses_back() {
        for line in [
            "a cycle pause",
            "#@reel Ctrl+o open-file   #Open",
            "g-g seek 0 absolute",
            r"x show-text \#1   #escaped",
        ] {
            let first = parse_raw_line(line).expect("line parses");
            let again = parse_raw_line(&first.conf_file_format()).expect("reparses");
            assert_eq!(again.raw_key(), first.raw_key());
            assert_eq!(again.command_tokens(), first.command_tokens());
            assert_eq!(again.is_app_command(), first.is_app_command());
            assert_eq!(again.comment(), first.comment());
        }
    }

    #[test]
    fn conf_text_keeps_order_and_duplicates() {
        let text = "# header\na quit\n\nb cycle mute\na ignore\n";
        let keys: Vec<_> = parse_conf_text(text)
            .iter()
            .map(|m| m.raw_key().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
    }

    #[test]
    fn clipboard_over_limit_is_rejected() {
        let text = "a quit\nb quit\nc quit";
        assert_eq!(parse_clipboard_text(text, 2), Vec::new());
        assert_eq!(parse_clipboard_text(text, 3).len(), 3);
    }

    #[test]
    fn to_conf_lines_drops_unwritable_records() {
        let mappings = vec![
            KeyMapping::engine("a", "quit"),
            KeyMapping::engine("b", ""),
        ];
        assert_eq!(
            to_conf_lines(&mappings),
            vec!["# Generated by reel".to_string(), "a quit".to_string()]
        );
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("input.conf");
        let mappings = vec![
            KeyMapping::engine("SPACE", "cycle pause"),
            KeyMapping::new("Meta+q", "quit", true, Some("bye".to_string())),
        ];
        save_conf_file(&path, &mappings).expect("save");
        let loaded = load_conf_file(&path, 100).expect("load");
        assert_eq!(loaded, mappings);
    }

    #[test]
    fn load_rejects_oversized_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("input.conf");
        std::fs::write(&path, "a quit\nb quit\nc quit\n").expect("write");
        assert_matches!(
            load_conf_file(&path, 2),
            Err(ConfFileError::TooManyLines { lines: 3, max: 2, .. })
        );
        assert_matches!(
            load_conf_file(&dir.path().join("missing.conf"), 2),
            Err(ConfFileError::Read { .. })
        );
    }
}
