//! Canonical key names.
//!
//! Both the keys written in `input.conf` and the keys translated from live
//! terminal events pass through [`normalize_key`], so a stored binding and a
//! runtime keystroke compare equal as plain strings.
//!
//! A key is one or more chords joined by `-` (`g-g`, `Ctrl+x-Ctrl+s`). A
//! chord is zero or more modifiers followed by a key, joined by `+`.

use std::fmt;

/// Longest key sequence the embedded engine accepts.
pub const MAX_KEY_SEQUENCE_LEN: usize = 4;

/// Pseudo-key used by the `default-bindings start` directive. It looks like a
/// sequence but never is one.
pub const DEFAULT_BINDINGS_KEY: &str = "default-bindings";

/// Named keys in their canonical spelling. Lookups are case-insensitive.
const NAMED_KEYS: &[&str] = &[
    "ENTER",
    "TAB",
    "SPACE",
    "IDEOGRAPHIC_SPACE",
    "BS",
    "ESC",
    "DEL",
    "INS",
    "HOME",
    "END",
    "PGUP",
    "PGDWN",
    "LEFT",
    "RIGHT",
    "UP",
    "DOWN",
    "PRINT",
    "POWER",
    "MENU",
    "PLAY",
    "PAUSE",
    "PLAYPAUSE",
    "PLAYONLY",
    "PAUSEONLY",
    "STOP",
    "FORWARD",
    "REWIND",
    "NEXT",
    "PREV",
    "VOLUME_UP",
    "VOLUME_DOWN",
    "MUTE",
    "HOMEPAGE",
    "WWW",
    "MAIL",
    "FAVORITES",
    "SEARCH",
    "SLEEP",
    "CANCEL",
    "RECORD",
    "CHANNEL_UP",
    "CHANNEL_DOWN",
    "KP0",
    "KP1",
    "KP2",
    "KP3",
    "KP4",
    "KP5",
    "KP6",
    "KP7",
    "KP8",
    "KP9",
    "KP_DEL",
    "KP_DEC",
    "KP_INS",
    "KP_ENTER",
    "SHARP",
    "UNMAPPED",
    "ANY_UNICODE",
    "MBTN_LEFT",
    "MBTN_MID",
    "MBTN_RIGHT",
    "MBTN_BACK",
    "MBTN_FORWARD",
    "MBTN_LEFT_DBL",
    "MBTN_RIGHT_DBL",
    "WHEEL_UP",
    "WHEEL_DOWN",
    "WHEEL_LEFT",
    "WHEEL_RIGHT",
];

const HIGHEST_FUNCTION_KEY: u8 = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyModifier {
    Shift,
    Ctrl,
    Alt,
    Meta,
}

impl KeyModifier {
    /// Output order of modifiers within a canonical chord.
    pub const ORDER: [KeyModifier; 4] = [
        KeyModifier::Shift,
        KeyModifier::Ctrl,
        KeyModifier::Alt,
        KeyModifier::Meta,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KeyModifier::Shift => "Shift",
            KeyModifier::Ctrl => "Ctrl",
            KeyModifier::Alt => "Alt",
            KeyModifier::Meta => "Meta",
        }
    }

    fn parse(part: &str) -> Option<Self> {
        match part.to_ascii_lowercase().as_str() {
            "shift" => Some(KeyModifier::Shift),
            "ctrl" | "control" => Some(KeyModifier::Ctrl),
            "alt" | "option" => Some(KeyModifier::Alt),
            "meta" | "cmd" | "command" | "super" => Some(KeyModifier::Meta),
            _ => None,
        }
    }
}

impl fmt::Display for KeyModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of held modifiers for one chord.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ModifierSet {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl ModifierSet {
    pub fn contains(self, modifier: KeyModifier) -> bool {
        match modifier {
            KeyModifier::Shift => self.shift,
            KeyModifier::Ctrl => self.ctrl,
            KeyModifier::Alt => self.alt,
            KeyModifier::Meta => self.meta,
        }
    }

    pub fn insert(&mut self, modifier: KeyModifier) {
        match modifier {
            KeyModifier::Shift => self.shift = true,
            KeyModifier::Ctrl => self.ctrl = true,
            KeyModifier::Alt => self.alt = true,
            KeyModifier::Meta => self.meta = true,
        }
    }

    pub fn is_empty(self) -> bool {
        !(self.shift || self.ctrl || self.alt || self.meta)
    }
}

/// Splits a chord into its modifiers and key. Returns `None` when a
/// `+`-separated prefix is not a modifier name.
fn parse_chord(chord: &str) -> Option<(ModifierSet, &str)> {
    let mut modifiers = ModifierSet::default();
    let mut rest = chord;
    // A `+` in first or last position belongs to the key itself (`+`, `Ctrl++`).
    while let Some(idx) = rest.find('+')
        && idx > 0
        && idx + 1 < rest.len()
    {
        modifiers.insert(KeyModifier::parse(&rest[..idx])?);
        rest = &rest[idx + 1..];
    }
    Some((modifiers, rest))
}

/// Splits without a length limit. `None` if any chord is malformed.
fn split_all(raw: &str) -> Option<Vec<String>> {
    let mut chords: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in raw.chars() {
        if ch == '-' && !current.is_empty() && !current.ends_with('+') {
            chords.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        chords.push(current);
    }
    chords
        .iter()
        .all(|chord| parse_chord(chord).is_some())
        .then_some(chords)
}

/// Splits a dash-joined key sequence into its chords.
///
/// At most [`MAX_KEY_SEQUENCE_LEN`] chords are kept. If any chord is
/// malformed the whole input is returned as a single element.
pub fn split_keystrokes(raw: &str) -> Vec<String> {
    match split_all(raw) {
        Some(mut chords) => {
            chords.truncate(MAX_KEY_SEQUENCE_LEN);
            chords
        }
        None => vec![raw.to_string()],
    }
}

/// Whether `raw` names more chords than the engine can match. Such bindings
/// are never reachable.
pub fn exceeds_max_sequence_len(raw: &str) -> bool {
    split_all(raw.trim()).is_some_and(|chords| chords.len() > MAX_KEY_SEQUENCE_LEN)
}

fn canonical_key(key: &str) -> String {
    if key.chars().count() == 1 {
        return key.to_string();
    }
    if let Some(named) = NAMED_KEYS
        .iter()
        .find(|named| named.eq_ignore_ascii_case(key))
    {
        return (*named).to_string();
    }
    if let Some(num) = key.strip_prefix(['f', 'F'])
        && let Ok(n) = num.parse::<u8>()
        && (1..=HIGHEST_FUNCTION_KEY).contains(&n)
    {
        return format!("F{n}");
    }
    key.to_string()
}

/// Upper-case form of a single cased letter, if it has a single-char one.
fn shifted_letter(key: &str) -> Option<char> {
    let mut chars = key.chars();
    let (Some(ch), None) = (chars.next(), chars.next()) else {
        return None;
    };
    if !(ch.is_lowercase() || ch.is_uppercase()) {
        return None;
    }
    let mut upper = ch.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(single), None) => Some(single),
        _ => None,
    }
}

/// Builds a canonical chord from already-separated parts.
pub fn format_chord(modifiers: ModifierSet, key: &str) -> String {
    let mut modifiers = modifiers;
    let mut key = canonical_key(key);

    if modifiers.shift
        && let Some(upper) = shifted_letter(&key)
    {
        key = upper.to_string();
        modifiers.shift = false;
    }

    let mut out = String::new();
    for modifier in KeyModifier::ORDER {
        if modifiers.contains(modifier) {
            out.push_str(modifier.name());
            out.push('+');
        }
    }
    out.push_str(&key);
    out
}

/// Canonical form of a single chord. Malformed chords are kept verbatim.
pub fn normalize_chord(chord: &str) -> String {
    match parse_chord(chord) {
        Some((modifiers, key)) => format_chord(modifiers, key),
        None => chord.to_string(),
    }
}

/// Canonical form of a key or key sequence.
pub fn normalize_key(raw: &str) -> String {
    split_keystrokes(raw.trim())
        .iter()
        .map(|chord| normalize_chord(chord))
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn split(raw: &str) -> Vec<String> {
        split_keystrokes(raw)
    }

    #[test]
    fn splits_single_and_modified_chords() {
        assert_eq!(split("T"), vec!["T"]);
        assert_eq!(split("Ctrl+T-L"), vec!["Ctrl+T", "L"]);
        assert_eq!(split("Test-1-2-3"), vec!["Test", "1", "2", "3"]);
    }

    #[test]
    fn dash_can_be_a_key() {
        assert_eq!(split("---"), vec!["-", "-"]);
        assert_eq!(split("Ctrl+--a"), vec!["Ctrl+-", "a"]);
    }

    #[test]
    fn extra_dashes_are_discarded() {
        assert_eq!(split("----"), vec!["-", "-"]);
        assert_eq!(split("-------"), vec!["-", "-", "-", "-"]);
        assert_eq!(split("--------"), vec!["-", "-", "-", "-"]);
        assert_eq!(split("---------"), vec!["-", "-", "-", "-"]);
    }

    #[test]
    fn malformed_chord_keeps_whole_input() {
        assert_eq!(split("-+-----"), vec!["-+-----"]);
    }

    #[test]
    fn sequences_longer_than_four_are_truncated() {
        assert_eq!(split("a-b-c-d-e"), vec!["a", "b", "c", "d"]);
        assert!(exceeds_max_sequence_len("a-b-c-d-e"));
        assert!(!exceeds_max_sequence_len("a-b-c-d"));
        assert!(!exceeds_max_sequence_len("-+-----"));
    }

    #[test]
    fn modifiers_are_reordered_and_recased() {
        assert_eq!(normalize_key("alt+ctrl+x"), "Ctrl+Alt+x");
        assert_eq!(normalize_key("META+shift+LEFT"), "Shift+Meta+LEFT");
        assert_eq!(normalize_key("cmd+q"), "Meta+q");
    }

    #[test]
    fn shift_letter_collapses_to_uppercase() {
        assert_eq!(normalize_key("Shift+a"), "A");
        assert_eq!(normalize_key("Shift+Ctrl+f"), "Ctrl+F");
        assert_eq!(normalize_key("Shift+1"), "Shift+1");
    }

    #[test]
    fn named_keys_use_canonical_spelling() {
        assert_eq!(normalize_key("enter"), "ENTER");
        assert_eq!(normalize_key("Ctrl+pgdwn"), "Ctrl+PGDWN");
        assert_eq!(normalize_key("f12"), "F12");
        assert_eq!(normalize_key("kp_enter"), "KP_ENTER");
        assert_eq!(normalize_key("f99"), "f99");
    }

    #[test]
    fn shift_folds_into_any_cased_letter() {
        assert_eq!(normalize_key("shift+é"), "É");
        assert_eq!(normalize_key("Shift+É"), "É");
        assert_eq!(normalize_key("Ctrl+shift+ж"), "Ctrl+Ж");
        assert_eq!(normalize_key("É"), "É");
        // No single-char upper case, or no case at all: Shift stays.
        assert_eq!(normalize_key("shift+ß"), "Shift+ß");
        assert_eq!(normalize_key("shift+中"), "Shift+中");
        assert_eq!(normalize_key("shift+1"), "Shift+1");
    }

    #[test]
    fn plus_can_be_a_key() {
        assert_eq!(normalize_key("+"), "+");
        assert_eq!(normalize_key("ctrl++"), "Ctrl++");
    }

    #[test]
    fn sequences_normalize_each_chord() {
        assert_eq!(normalize_key("ctrl+x-shift+s"), "Ctrl+x-S");
        assert_eq!(normalize_key("g-g"), "g-g");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["Alt+shift+ctrl+k", "---", "Ctrl+--a", "space-b-c", "-+-----", "x"] {
            let once = normalize_key(raw);
            assert_eq!(normalize_key(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn format_chord_matches_normalized_text() {
        let modifiers = ModifierSet {
            shift: true,
            ctrl: true,
            ..ModifierSet::default()
        };
        assert_eq!(format_chord(modifiers, "a"), normalize_key("ctrl+shift+a"));
        assert_eq!(format_chord(ModifierSet::default(), "space"), "SPACE");
    }
}
