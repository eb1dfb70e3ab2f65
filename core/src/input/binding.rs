use serde::Deserialize;
use serde::Serialize;

use crate::input::mapping::KeyMapping;
use crate::input::section::InputBindingOrigin;

/// Menu entry a binding is shown on, for bindings that do not come from the
/// conf file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuItemLink {
    Extension {
        extension: String,
        identifier: String,
    },
    SavedFilter {
        name: String,
    },
}

/// One record as seen after conflict resolution.
///
/// This is a plain value: it names its source section but holds no
/// reference to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBinding {
    mapping: KeyMapping,
    origin: InputBindingOrigin,
    source_section: String,
    is_enabled: bool,
    display_message: Option<String>,
    menu_item: Option<MenuItemLink>,
}

impl InputBinding {
    pub fn new(
        mapping: KeyMapping,
        origin: InputBindingOrigin,
        source_section: impl Into<String>,
    ) -> Self {
        Self {
            mapping,
            origin,
            source_section: source_section.into(),
            is_enabled: true,
            display_message: None,
            menu_item: None,
        }
    }

    pub fn with_menu_item(mut self, menu_item: Option<MenuItemLink>) -> Self {
        self.menu_item = menu_item;
        self
    }

    /// Marks the binding as not in effect, with a reason for display.
    pub fn disable(&mut self, message: impl Into<String>) {
        self.is_enabled = false;
        self.display_message = Some(message.into());
    }

    pub fn mapping(&self) -> &KeyMapping {
        &self.mapping
    }

    pub fn origin(&self) -> InputBindingOrigin {
        self.origin
    }

    pub fn source_section(&self) -> &str {
        &self.source_section
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn display_message(&self) -> Option<&str> {
        self.display_message.as_deref()
    }

    pub fn menu_item(&self) -> Option<&MenuItemLink> {
        self.menu_item.as_ref()
    }

    pub fn can_be_modified(&self) -> bool {
        self.origin.can_be_modified()
    }

    pub fn can_be_copied(&self) -> bool {
        self.origin.can_be_copied()
    }
}
