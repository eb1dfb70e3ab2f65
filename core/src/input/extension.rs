//! Key equivalents of extension menu items.

use crate::input::binding::MenuItemLink;
use crate::input::key_name::normalize_key;
use crate::input::mapping::KeyMapping;
use crate::input::section::InputBindingOrigin;
use crate::input::section::InputSection;
use crate::input::section::PLUGINS_SECTION_NAME;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMenuItem {
    pub extension: String,
    pub identifier: String,
    pub title: String,
    pub key_equivalent: Option<String>,
}

impl ExtensionMenuItem {
    /// App-command record for the item's key equivalent. Invoking it is up to
    /// the menu, so the command only identifies the item.
    pub fn key_mapping(&self) -> Option<KeyMapping> {
        let key = self
            .key_equivalent
            .as_deref()
            .map(normalize_key)
            .filter(|key| !key.is_empty())?;
        let command = format!("extension-menu {} {}", self.extension, self.identifier);
        Some(KeyMapping::new(key, command, true, Some(self.title.clone())))
    }

    pub fn menu_item_link(&self) -> MenuItemLink {
        MenuItemLink::Extension {
            extension: self.extension.clone(),
            identifier: self.identifier.clone(),
        }
    }
}

/// Builds the shared, weak section holding every extension key equivalent.
pub fn extension_menu_section(items: &[ExtensionMenuItem]) -> InputSection {
    let linked = items
        .iter()
        .filter_map(|item| Some((item.key_mapping()?, item.menu_item_link())))
        .collect();
    InputSection::with_menu_items(
        PLUGINS_SECTION_NAME,
        linked,
        false,
        InputBindingOrigin::ExtensionMenu,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(identifier: &str, key: Option<&str>) -> ExtensionMenuItem {
        ExtensionMenuItem {
            extension: "opensub".to_string(),
            identifier: identifier.to_string(),
            title: format!("Item {identifier}"),
            key_equivalent: key.map(str::to_string),
        }
    }

    #[test]
    fn key_equivalent_becomes_app_command() {
        let mapping = item("search", Some("meta+shift+s"))
            .key_mapping()
            .expect("item has key equivalent");
        assert!(mapping.is_app_command());
        assert_eq!(mapping.normalized_key(), "Meta+S");
        assert_eq!(mapping.command_tokens(), ["extension-menu", "opensub", "search"]);
        assert_eq!(mapping.comment(), Some("Item search"));
    }

    #[test]
    fn section_is_weak_and_linked() {
        let section = extension_menu_section(&[item("a", Some("x")), item("b", None)]);
        assert_eq!(section.name(), PLUGINS_SECTION_NAME);
        assert!(!section.is_force());
        assert_eq!(section.mappings().len(), 1);
        assert_eq!(
            section.menu_item_for("x"),
            Some(&MenuItemLink::Extension {
                extension: "opensub".to_string(),
                identifier: "a".to_string(),
            })
        );
    }
}
