use std::collections::HashMap;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;
use strum_macros::EnumString;
use tracing::warn;

use crate::input::binding::MenuItemLink;
use crate::input::conf_file::parse_conf_text;
use crate::input::key_name::exceeds_max_sequence_len;
use crate::input::mapping::KeyMapping;

/// Section holding the user's `input.conf`.
pub const DEFAULT_SECTION_NAME: &str = "default";
pub const AUDIO_FILTERS_SECTION_NAME: &str = "Reel Audio Filters";
pub const VIDEO_FILTERS_SECTION_NAME: &str = "Reel Video Filters";
pub const PLUGINS_SECTION_NAME: &str = "Reel Plugins";

/// Sections owned by the application rather than by a script. They are
/// always defined and must never be disabled.
pub const SHARED_SECTION_NAMES: [&str; 4] = [
    DEFAULT_SECTION_NAME,
    AUDIO_FILTERS_SECTION_NAME,
    VIDEO_FILTERS_SECTION_NAME,
    PLUGINS_SECTION_NAME,
];

pub fn is_shared_section(name: &str) -> bool {
    SHARED_SECTION_NAMES.contains(&name)
}

/// Where a binding came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputBindingOrigin {
    /// The user's `input.conf`.
    ConfFile,
    /// Key equivalent of an extension's menu item.
    ExtensionMenu,
    /// Shortcut of a saved audio/video filter.
    SavedFilter,
    /// A section defined at runtime by an engine script.
    EmbeddedScript,
}

impl InputBindingOrigin {
    pub fn can_be_modified(self) -> bool {
        self == InputBindingOrigin::ConfFile
    }

    pub fn can_be_copied(self) -> bool {
        matches!(
            self,
            InputBindingOrigin::ConfFile | InputBindingOrigin::EmbeddedScript
        )
    }
}

/// Named, ordered collection of bindings from one source.
///
/// `authored` keeps every record as given; [`InputSection::mappings`] is the
/// materialized view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSection {
    name: String,
    authored: Vec<KeyMapping>,
    is_force: bool,
    origin: InputBindingOrigin,
    menu_items: HashMap<String, MenuItemLink>,
}

impl InputSection {
    pub fn new(
        name: impl Into<String>,
        mappings: Vec<KeyMapping>,
        is_force: bool,
        origin: InputBindingOrigin,
    ) -> Self {
        Self {
            name: name.into(),
            authored: mappings,
            is_force,
            origin,
            menu_items: HashMap::new(),
        }
    }

    /// Section whose records each open a menu entry.
    pub fn with_menu_items(
        name: impl Into<String>,
        linked: Vec<(KeyMapping, MenuItemLink)>,
        is_force: bool,
        origin: InputBindingOrigin,
    ) -> Self {
        let mut menu_items = HashMap::with_capacity(linked.len());
        let mut mappings = Vec::with_capacity(linked.len());
        for (mapping, link) in linked {
            menu_items.insert(mapping.normalized_key().to_string(), link);
            mappings.push(mapping);
        }
        let mut section = Self::new(name, mappings, is_force, origin);
        section.menu_items = menu_items;
        section
    }

    /// Section sent by an engine script through `define-section`.
    ///
    /// `flags` is `default` (weak, also when empty) or `force`.
    pub fn from_define_section(name: impl Into<String>, contents: &str, flags: &str) -> Self {
        let name = name.into();
        let is_force = match flags.trim() {
            "" | "default" => false,
            "force" => true,
            other => {
                warn!("Unknown define-section flags {other:?} for section {name:?}; using default");
                false
            }
        };
        Self::new(
            name,
            parse_conf_text(contents),
            is_force,
            InputBindingOrigin::EmbeddedScript,
        )
    }

    /// Same section with its contents replaced wholesale. Menu links are
    /// kept for keys that are still bound.
    pub fn with_mappings(&self, mappings: Vec<KeyMapping>) -> Self {
        let menu_items = self
            .menu_items
            .iter()
            .filter(|(key, _)| mappings.iter().any(|m| m.normalized_key() == key.as_str()))
            .map(|(key, link)| (key.clone(), link.clone()))
            .collect();
        Self {
            name: self.name.clone(),
            authored: mappings,
            is_force: self.is_force,
            origin: self.origin,
            menu_items,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records with unique normalized keys: a repeated key keeps only its
    /// last record, at that record's position. Sequences longer than
    /// [`MAX_KEY_SEQUENCE_LEN`](crate::input::key_name::MAX_KEY_SEQUENCE_LEN)
    /// chords are left out.
    pub fn mappings(&self) -> Vec<KeyMapping> {
        let mut seen = HashSet::new();
        let mut unique: Vec<KeyMapping> = self
            .authored
            .iter()
            .rev()
            .filter(|mapping| !exceeds_max_sequence_len(mapping.raw_key()))
            .filter(|mapping| seen.insert(mapping.normalized_key()))
            .cloned()
            .collect();
        unique.reverse();
        unique
    }

    pub fn authored(&self) -> &[KeyMapping] {
        &self.authored
    }

    pub fn is_force(&self) -> bool {
        self.is_force
    }

    pub fn origin(&self) -> InputBindingOrigin {
        self.origin
    }

    pub fn is_empty(&self) -> bool {
        self.authored.is_empty()
    }

    pub fn menu_item_for(&self, normalized_key: &str) -> Option<&MenuItemLink> {
        self.menu_items.get(normalized_key)
    }
}
