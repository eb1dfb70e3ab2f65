//! Per-window key sequence matching.
//!
//! The resolver remembers the last few keys pressed in its window and, on
//! every new key, tries the newest key alone, then the newest two, and so
//! on. The shortest bound candidate wins.

use reel_utils_ring_buffer::RingBuffer;
use tracing::debug;
use tracing::error;
use tracing::trace;

use crate::input::binding::InputBinding;
use crate::input::builder::ActiveBindings;
use crate::input::key_name::MAX_KEY_SEQUENCE_LEN;
use crate::input::key_name::normalize_key;
use crate::input::mapping::KeyMapping;
use crate::input::section::InputBindingOrigin;

#[derive(Debug, Default)]
pub struct KeyResolver {
    window: String,
    history: RingBuffer<String, MAX_KEY_SEQUENCE_LEN>,
}

impl KeyResolver {
    pub fn new(window: impl Into<String>) -> Self {
        Self {
            window: window.into(),
            history: RingBuffer::new(),
        }
    }

    pub fn window(&self) -> &str {
        &self.window
    }

    /// Keys currently held as a possible sequence prefix, oldest first.
    pub fn history(&self) -> Vec<&str> {
        self.history.iter().map(String::as_str).collect()
    }

    /// Forgets all remembered keys. Call this whenever a keystroke was
    /// consumed elsewhere before reaching this resolver.
    pub fn reset(&mut self) {
        if !self.history.is_empty() {
            trace!("[{}] Clearing key history {}", self.window, self.history);
        }
        self.history.clear();
    }

    /// Resolves a complete key or sequence without touching the history.
    pub fn lookup<'a>(&self, key: &str, bindings: &'a ActiveBindings) -> Option<&'a InputBinding> {
        bindings.table().get(&normalize_key(key))
    }

    /// Feeds one key press and returns what it resolves to.
    ///
    /// - `Some` record with a real command: a binding fired and the history
    ///   was cleared.
    /// - `Some` record whose command is `ignore`: the key should be swallowed
    ///   silently, usually because a sequence is still in progress.
    /// - `None`: nothing is bound. The history is kept.
    pub fn resolve_key(&mut self, key_name: &str, bindings: &ActiveBindings) -> Option<KeyMapping> {
        let key_name = normalize_key(key_name);
        if key_name.is_empty() {
            debug!("[{}] Ignoring empty key name", self.window);
            return None;
        }
        self.history.push_head(key_name);

        let newest_first: Vec<String> = self.history.iter_newest_first().cloned().collect();
        let mut candidate = String::new();
        let mut saw_partial = false;
        for key in &newest_first {
            candidate = if candidate.is_empty() {
                key.clone()
            } else {
                format!("{key}-{candidate}")
            };

            match bindings.table().get(&candidate) {
                Some(binding) if binding.mapping().is_ignored() => {
                    trace!("[{}] {candidate:?} is explicitly ignored", self.window);
                    saw_partial = true;
                }
                Some(binding) if binding.origin() == InputBindingOrigin::ExtensionMenu => {
                    error!(
                        "[{}] Key {candidate:?} resolved to an extension menu binding, \
                         which should have been handled by the menu",
                        self.window
                    );
                    return None;
                }
                Some(binding) => {
                    debug!(
                        "[{}] Resolved {candidate:?} -> {}",
                        self.window,
                        binding.mapping().readable_command()
                    );
                    self.history.clear();
                    return Some(binding.mapping().clone());
                }
                None if bindings.partials().contains(&candidate) => {
                    trace!("[{}] {candidate:?} is a partial sequence", self.window);
                    saw_partial = true;
                }
                None => {}
            }
        }

        if saw_partial {
            debug!("[{}] Waiting for more keys after {candidate:?}", self.window);
            Some(KeyMapping::ignore(candidate))
        } else {
            debug!("[{}] No binding for {}", self.window, self.history);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::builder::ActiveBindingsBuilder;
    use crate::input::builder::EnableOrder;
    use crate::input::extension::ExtensionMenuItem;
    use crate::input::extension::extension_menu_section;
    use crate::input::section::DEFAULT_SECTION_NAME;
    use crate::input::section::InputSection;
    use crate::input::section_stack::InputSectionStack;
    use pretty_assertions::assert_eq;

    fn bindings(lines: &[(&str, &str)]) -> ActiveBindings {
        let mappings = lines
            .iter()
            .map(|(key, command)| KeyMapping::engine(*key, *command))
            .collect();
        let stack = InputSectionStack::new(vec![InputSection::new(
            DEFAULT_SECTION_NAME,
            mappings,
            true,
            InputBindingOrigin::ConfFile,
        )]);
        ActiveBindingsBuilder::new(&stack, &EnableOrder).build(1)
    }

    fn command(result: Option<KeyMapping>) -> Option<String> {
        result.map(|mapping| mapping.raw_command().to_string())
    }

    #[test]
    fn shortest_match_wins() {
        let table = bindings(&[("a", "first"), ("a-b", "second")]);
        let mut resolver = KeyResolver::new("main");

        assert_eq!(command(resolver.resolve_key("a", &table)).as_deref(), Some("first"));
        assert!(resolver.history().is_empty());
        assert_eq!(resolver.resolve_key("b", &table), None);
        assert_eq!(resolver.history(), vec!["b"]);
    }

    #[test]
    fn partial_sequence_is_swallowed_until_complete() {
        let table = bindings(&[("a-b-c", "show-text abc")]);
        let mut resolver = KeyResolver::new("main");

        let first = resolver.resolve_key("a", &table).expect("partial match");
        assert!(first.is_ignored());
        assert_eq!(first.raw_key(), "a");

        let second = resolver.resolve_key("b", &table).expect("partial match");
        assert!(second.is_ignored());
        assert_eq!(second.raw_key(), "a-b");

        assert_eq!(
            command(resolver.resolve_key("c", &table)).as_deref(),
            Some("show-text abc")
        );
        assert!(resolver.history().is_empty());
    }

    #[test]
    fn unbound_key_keeps_returning_none() {
        let table = bindings(&[]);
        let mut resolver = KeyResolver::new("main");
        assert_eq!(resolver.resolve_key("x", &table), None);
        assert_eq!(resolver.resolve_key("x", &table), None);
        assert_eq!(resolver.history(), vec!["x", "x"]);
    }

    #[test]
    fn oldest_key_is_evicted_at_capacity() {
        let table = bindings(&[("a-b-c-d", "show-text abcd")]);
        let mut resolver = KeyResolver::new("main");

        assert_eq!(resolver.resolve_key("z", &table), None);
        for key in ["a", "b", "c"] {
            let partial = resolver.resolve_key(key, &table).expect("partial match");
            assert!(partial.is_ignored());
        }
        assert_eq!(resolver.history(), vec!["z", "a", "b", "c"]);
        assert_eq!(
            command(resolver.resolve_key("d", &table)).as_deref(),
            Some("show-text abcd")
        );
    }

    #[test]
    fn same_sequence_resolves_identically_after_reset() {
        let table = bindings(&[("g-g", "seek 0 absolute")]);
        let mut resolver = KeyResolver::new("main");

        let fire = |resolver: &mut KeyResolver| {
            resolver.resolve_key("g", &table);
            resolver.resolve_key("g", &table)
        };
        let first = fire(&mut resolver);
        resolver.reset();
        let second = fire(&mut resolver);
        assert_eq!(first, second);
        assert_eq!(command(first).as_deref(), Some("seek 0 absolute"));
    }

    #[test]
    fn play_pause_and_go_to_start() {
        let table = bindings(&[("p", "cycle pause"), ("g-g", "seek 0 absolute")]);
        let mut resolver = KeyResolver::new("main");

        assert!(resolver.resolve_key("g", &table).is_some_and(|m| m.is_ignored()));
        assert_eq!(
            command(resolver.resolve_key("g", &table)).as_deref(),
            Some("seek 0 absolute")
        );
        assert!(resolver.history().is_empty());
        assert_eq!(command(resolver.resolve_key("p", &table)).as_deref(), Some("cycle pause"));
    }

    #[test]
    fn explicit_ignore_keeps_extending() {
        let table = bindings(&[("d", "ignore"), ("d-e", "show-text de")]);
        let mut resolver = KeyResolver::new("main");

        assert!(resolver.resolve_key("d", &table).is_some_and(|m| m.is_ignored()));
        assert_eq!(command(resolver.resolve_key("e", &table)).as_deref(), Some("show-text de"));
    }

    #[test]
    fn reset_discards_partial_sequence() {
        let table = bindings(&[("a-b", "show-text ab")]);
        let mut resolver = KeyResolver::new("main");

        resolver.resolve_key("a", &table);
        resolver.reset();
        assert_eq!(resolver.resolve_key("b", &table), None);
    }

    #[test]
    fn extension_menu_binding_is_never_returned() {
        let stack = InputSectionStack::new(vec![extension_menu_section(&[ExtensionMenuItem {
            extension: "ext".to_string(),
            identifier: "open".to_string(),
            title: "Open".to_string(),
            key_equivalent: Some("o".to_string()),
        }])]);
        let table = ActiveBindingsBuilder::new(&stack, &EnableOrder).build(1);
        let mut resolver = KeyResolver::new("main");

        assert!(table.table().contains_key("o"));
        assert_eq!(resolver.resolve_key("o", &table), None);
    }

    #[test]
    fn lookup_normalizes_and_leaves_history_alone() {
        let table = bindings(&[("Ctrl+x-S", "write-watch-later-config")]);
        let resolver = KeyResolver::new("main");
        let found = resolver.lookup("ctrl+x-shift+s", &table).expect("bound");
        assert_eq!(found.mapping().raw_command(), "write-watch-later-config");
        assert!(resolver.history().is_empty());
    }
}
