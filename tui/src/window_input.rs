use std::sync::Arc;

use crossterm::event::KeyEvent;
use reel_core::input::BindingRegistry;
use reel_core::input::KeyMapping;
use reel_core::input::RegistryError;
use reel_core::input::KeyResolver;
use tracing::debug;

use crate::key_event::key_name_from_event;

/// What a single key press amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// Nothing is bound; the key should be passed on.
    Unbound,
    /// The key is swallowed, usually because a sequence is in progress.
    Ignored,
    Command(KeyMapping),
}

/// Key input for one window. Each window keeps its own sequence history
/// while all of them read the shared bindings.
pub struct WindowKeyInput {
    registry: Arc<BindingRegistry>,
    resolver: KeyResolver,
}

impl WindowKeyInput {
    pub fn new(registry: Arc<BindingRegistry>, window: impl Into<String>) -> Self {
        Self {
            registry,
            resolver: KeyResolver::new(window),
        }
    }

    pub fn window(&self) -> &str {
        self.resolver.window()
    }

    /// Makes this window's sections the ones the shared table is built from.
    pub fn focus(&self) -> Result<u64, RegistryError> {
        self.registry.set_active_window(self.window())
    }

    pub fn pending_keys(&self) -> Vec<&str> {
        self.resolver.history()
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) -> KeyOutcome {
        match key_name_from_event(event) {
            Some(key_name) => self.handle_key_name(&key_name),
            None => {
                debug!("[{}] No key name for {event:?}", self.resolver.window());
                KeyOutcome::Unbound
            }
        }
    }

    pub fn handle_key_name(&mut self, key_name: &str) -> KeyOutcome {
        let bindings = self.registry.current();
        match self.resolver.resolve_key(key_name, &bindings) {
            None => KeyOutcome::Unbound,
            Some(mapping) if mapping.is_ignored() => KeyOutcome::Ignored,
            Some(mapping) => KeyOutcome::Command(mapping),
        }
    }

    /// Tells the window a keystroke was consumed before reaching the
    /// bindings, so any sequence in progress is broken.
    pub fn key_was_handled(&mut self) {
        self.resolver.reset();
    }
}
