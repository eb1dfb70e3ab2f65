//! Saved audio/video filters and their keyboard shortcuts.

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::input::binding::MenuItemLink;
use crate::input::key_name::KeyModifier;
use crate::input::key_name::ModifierSet;
use crate::input::key_name::format_chord;
use crate::input::mapping::KeyMapping;
use crate::input::section::AUDIO_FILTERS_SECTION_NAME;
use crate::input::section::InputBindingOrigin;
use crate::input::section::InputSection;
use crate::input::section::VIDEO_FILTERS_SECTION_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Audio,
    Video,
}

impl FilterKind {
    /// Engine command that manipulates this kind of filter chain.
    pub fn command(self) -> &'static str {
        match self {
            FilterKind::Audio => "af",
            FilterKind::Video => "vf",
        }
    }

    pub fn section_name(self) -> &'static str {
        match self {
            FilterKind::Audio => AUDIO_FILTERS_SECTION_NAME,
            FilterKind::Video => VIDEO_FILTERS_SECTION_NAME,
        }
    }
}

/// A filter the user saved, optionally with a keyboard shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct SavedFilter {
    /// Display name of the filter.
    pub name: String,
    pub kind: FilterKind,
    /// Filter string passed to the engine, e.g. `yadif`.
    pub filter: String,
    /// Key that toggles the filter. Empty or absent means no shortcut.
    #[serde(default)]
    pub shortcut_key: Option<String>,
    /// Modifier letters held with the shortcut: `c` (ctrl), `o` (option/alt),
    /// `s` (shift), `m` (meta/command).
    #[serde(default)]
    pub modifiers: String,
}

/// Decodes compact modifier letters. Unknown letters are dropped.
pub fn parse_modifier_letters(letters: &str) -> ModifierSet {
    let mut set = ModifierSet::default();
    for letter in letters.chars() {
        let modifier = match letter {
            'c' => KeyModifier::Ctrl,
            'o' => KeyModifier::Alt,
            's' => KeyModifier::Shift,
            'm' => KeyModifier::Meta,
            other => {
                warn!("Ignoring unknown filter shortcut modifier {other:?}");
                continue;
            }
        };
        set.insert(modifier);
    }
    set
}

impl SavedFilter {
    /// Binding that toggles this filter, if it has a shortcut.
    pub fn key_mapping(&self) -> Option<KeyMapping> {
        let key = self
            .shortcut_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())?;
        let chord = format_chord(parse_modifier_letters(&self.modifiers), key);
        let command = format!("{} toggle {}", self.kind.command(), self.filter);
        Some(KeyMapping::new(chord, command, false, Some(self.name.clone())))
    }
}

/// Builds the shared section holding the shortcuts of every saved filter of
/// `kind`.
pub fn saved_filters_section(kind: FilterKind, filters: &[SavedFilter]) -> InputSection {
    let linked = filters
        .iter()
        .filter(|filter| filter.kind == kind)
        .filter_map(|filter| {
            let mapping = filter.key_mapping()?;
            let link = MenuItemLink::SavedFilter {
                name: filter.name.clone(),
            };
            Some((mapping, link))
        })
        .collect();
    InputSection::with_menu_items(
        kind.section_name(),
        linked,
        true,
        InputBindingOrigin::SavedFilter,
    )
}
