//! Stack of enabled input sections, following the embedded engine's
//! `define-section` / `enable-section` / `disable-section` commands.
//!
//! Sections higher on the stack are preferred. A section can appear on the
//! stack at most once; enabling it again moves it to the top.

use std::collections::HashMap;

use tracing::debug;
use tracing::error;

use crate::input::mapping::KeyMapping;
use crate::input::section::InputSection;
use crate::input::section::is_shared_section;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnableFlags {
    /// Shadow every section enabled before this one.
    pub exclusive: bool,
}

impl EnableFlags {
    /// Parses `+`-separated flags, e.g. `exclusive+allow-hide-cursor`.
    pub fn parse(flags: &str, section_name: &str) -> Self {
        let mut parsed = EnableFlags::default();
        for flag in flags.split('+').map(str::trim).filter(|f| !f.is_empty()) {
            match flag {
                "exclusive" => parsed.exclusive = true,
                "allow-hide-cursor" | "allow-vo-dragging" => {}
                other => {
                    error!(
                        "Unexpected flag {other:?} when enabling input section {section_name:?}"
                    );
                }
            }
        }
        parsed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledSection {
    pub name: String,
    pub is_exclusive: bool,
}

/// A section that takes part in resolution, with its position in the stack
/// (0 is the bottom).
#[derive(Debug, Clone, Copy)]
pub struct ActiveSection<'a> {
    pub section: &'a InputSection,
    pub stack_position: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InputSectionStack {
    defined: HashMap<String, InputSection>,
    /// Bottom to top.
    enabled: Vec<EnabledSection>,
}

impl InputSectionStack {
    /// Defines and enables `sections`, first one at the bottom.
    pub fn new(sections: Vec<InputSection>) -> Self {
        let mut stack = Self::default();
        for section in sections {
            debug!("Adding initial enabled section {:?}", section.name());
            stack.enabled.push(EnabledSection {
                name: section.name().to_string(),
                is_exclusive: false,
            });
            stack.defined.insert(section.name().to_string(), section);
        }
        stack
    }

    /// Adds or replaces a section definition. An empty redefinition of a
    /// section that already exists also takes it off the stack.
    pub fn define_section(&mut self, section: InputSection) {
        if section.is_empty() && self.defined.contains_key(section.name()) {
            debug!(
                "New definition of {:?} contains no bindings: disabling it",
                section.name()
            );
            self.disable_section(section.name());
        }
        self.defined.insert(section.name().to_string(), section);
    }

    /// Puts a defined section on top of the stack. Returns `false` if no
    /// section with that name was ever defined.
    pub fn enable_section(&mut self, name: &str, flags: EnableFlags) -> bool {
        if !self.defined.contains_key(name) {
            error!("Cannot enable section {name:?}: it was never defined");
            return false;
        }
        self.enabled.retain(|enabled| enabled.name != name);
        self.enabled.push(EnabledSection {
            name: name.to_string(),
            is_exclusive: flags.exclusive,
        });
        debug!(
            "Enabled input section {name:?} (exclusive={}); stack: {:?}",
            flags.exclusive,
            self.enabled_names()
        );
        true
    }

    /// Removes a section's definition and stack entry. Returns `false` if the
    /// section was not defined.
    ///
    /// # Panics
    ///
    /// Panics if `name` is one of the shared sections, which must stay
    /// defined for the lifetime of the stack.
    pub fn disable_section(&mut self, name: &str) -> bool {
        if !self.defined.contains_key(name) {
            return false;
        }
        assert!(
            !is_shared_section(name),
            "shared input section {name:?} cannot be disabled"
        );
        self.enabled.retain(|enabled| enabled.name != name);
        self.defined.remove(name);
        debug!("Disabled input section {name:?}");
        true
    }

    /// Replaces the contents of a defined section, keeping its flags and
    /// stack position.
    pub fn replace_section_mappings(&mut self, name: &str, mappings: Vec<KeyMapping>) -> bool {
        let Some(existing) = self.defined.get(name) else {
            error!("Cannot replace bindings of section {name:?}: it was never defined");
            return false;
        };
        let replaced = existing.with_mappings(mappings);
        self.defined.insert(name.to_string(), replaced);
        true
    }

    /// Replaces a defined section wholesale, keeping its stack position.
    pub fn replace_section(&mut self, section: InputSection) -> bool {
        if !self.defined.contains_key(section.name()) {
            error!(
                "Cannot replace section {:?}: it was never defined",
                section.name()
            );
            return false;
        }
        self.defined.insert(section.name().to_string(), section);
        true
    }

    pub fn section(&self, name: &str) -> Option<&InputSection> {
        self.defined.get(name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.iter().any(|enabled| enabled.name == name)
    }

    pub fn enabled_names(&self) -> Vec<&str> {
        self.enabled.iter().map(|enabled| enabled.name.as_str()).collect()
    }

    /// Sections that take part in resolution, bottom to top. When any
    /// exclusive section is enabled, everything below the topmost one is
    /// shadowed.
    pub fn active_sections(&self) -> Vec<ActiveSection<'_>> {
        let first_visible = self
            .enabled
            .iter()
            .rposition(|enabled| enabled.is_exclusive)
            .unwrap_or(0);

        self.enabled
            .iter()
            .enumerate()
            .skip(first_visible)
            .filter_map(|(stack_position, enabled)| match self.defined.get(&enabled.name) {
                Some(section) => Some(ActiveSection {
                    section,
                    stack_position,
                }),
                None => {
                    error!("Enabled section {:?} has no definition", enabled.name);
                    None
                }
            })
            .collect()
    }

    /// Drops every section, shared ones included.
    pub fn clear(&mut self) {
        self.defined.clear();
        self.enabled.clear();
    }
}
