//! Process-wide owner of the active bindings.
//!
//! The shared sections (user conf, saved filters, extension menu) are common
//! to every window. Script sections belong to the window whose engine
//! defined them, and only the active window's sections take part in the
//! published table.
//!
//! Readers take a snapshot with [`BindingRegistry::current`] and never block.
//! Every mutation runs under a single writer lock, rebuilds the whole
//! snapshot, swaps it in and only then announces the new version.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;
use tracing::info;

use crate::input::builder::ActiveBindings;
use crate::input::builder::ActiveBindingsBuilder;
use crate::input::builder::EnableOrder;
use crate::input::builder::ForcePrecedence;
use crate::input::extension::ExtensionMenuItem;
use crate::input::extension::extension_menu_section;
use crate::input::filter::FilterKind;
use crate::input::filter::SavedFilter;
use crate::input::filter::saved_filters_section;
use crate::input::mapping::KeyMapping;
use crate::input::section::DEFAULT_SECTION_NAME;
use crate::input::section::InputBindingOrigin;
use crate::input::section::InputSection;
use crate::input::section::is_shared_section;
use crate::input::section_stack::EnableFlags;
use crate::input::section_stack::InputSectionStack;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Sent after a new snapshot has been swapped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingsChanged {
    pub version: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("binding registry has been shut down")]
    ShutDown,
    #[error("input section {0:?} is not defined")]
    UnknownSection(String),
    #[error("input section {0:?} is reserved and cannot be redefined")]
    ReservedSection(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrySettings {
    /// Dump every binding at `debug` level on each rebuild.
    pub log_bindings_rebuild: bool,
}

struct RegistryState {
    /// Only the shared sections. Used while no window is active and as the
    /// starting point of each window's stack.
    shared: InputSectionStack,
    windows: HashMap<String, InputSectionStack>,
    active_window: Option<String>,
    version: u64,
    is_shut_down: bool,
}

impl RegistryState {
    fn active_stack(&self) -> &InputSectionStack {
        self.active_window
            .as_ref()
            .and_then(|window| self.windows.get(window))
            .unwrap_or(&self.shared)
    }

    fn is_active(&self, window: &str) -> bool {
        self.active_window.as_deref() == Some(window)
    }

    fn window_stack(&mut self, window: &str) -> &mut InputSectionStack {
        let shared = &self.shared;
        self.windows.entry(window.to_string()).or_insert_with(|| {
            debug!("Creating input section stack for window {window:?}");
            shared.clone()
        })
    }

    /// Applies `mutate` to the shared stack and to every window's copy.
    fn for_each_stack(&mut self, mut mutate: impl FnMut(&mut InputSectionStack)) {
        mutate(&mut self.shared);
        for stack in self.windows.values_mut() {
            mutate(stack);
        }
    }
}

pub struct BindingRegistry {
    current: ArcSwap<ActiveBindings>,
    state: Mutex<RegistryState>,
    changed_tx: broadcast::Sender<BindingsChanged>,
    precedence: Box<dyn ForcePrecedence>,
    settings: RegistrySettings,
}

fn shared_sections() -> Vec<InputSection> {
    vec![
        InputSection::new(
            DEFAULT_SECTION_NAME,
            Vec::new(),
            true,
            InputBindingOrigin::ConfFile,
        ),
        saved_filters_section(FilterKind::Audio, &[]),
        saved_filters_section(FilterKind::Video, &[]),
        extension_menu_section(&[]),
    ]
}

impl BindingRegistry {
    pub fn new(settings: RegistrySettings, precedence: Box<dyn ForcePrecedence>) -> Self {
        let shared = InputSectionStack::new(shared_sections());
        let initial = ActiveBindingsBuilder::new(&shared, precedence.as_ref())
            .log_rebuild(settings.log_bindings_rebuild)
            .build(0);
        let (changed_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            current: ArcSwap::from_pointee(initial),
            state: Mutex::new(RegistryState {
                shared,
                windows: HashMap::new(),
                active_window: None,
                version: 0,
                is_shut_down: false,
            }),
            changed_tx,
            precedence,
            settings,
        }
    }

    pub fn with_default_precedence(settings: RegistrySettings) -> Self {
        Self::new(settings, Box::new(EnableOrder))
    }

    /// Latest complete snapshot.
    pub fn current(&self) -> Arc<ActiveBindings> {
        self.current.load_full()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BindingsChanged> {
        self.changed_tx.subscribe()
    }

    pub fn active_window(&self) -> Option<String> {
        self.lock_state().active_window.clone()
    }

    /// Sections on the active window's stack, bottom to top.
    pub fn enabled_sections(&self) -> Vec<String> {
        self.lock_state()
            .active_stack()
            .enabled_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Sections on `window`'s stack. Windows that never defined a section
    /// see only the shared ones.
    pub fn enabled_sections_for(&self, window: &str) -> Vec<String> {
        let state = self.lock_state();
        state
            .windows
            .get(window)
            .unwrap_or(&state.shared)
            .enabled_names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Makes `window`'s script sections the ones that resolve keys. Does not
    /// rebuild when the window is already active.
    pub fn set_active_window(&self, window: &str) -> Result<u64, RegistryError> {
        let mut state = self.lock_state();
        if state.is_shut_down {
            return Err(RegistryError::ShutDown);
        }
        if state.is_active(window) {
            return Ok(state.version);
        }
        state.window_stack(window);
        state.active_window = Some(window.to_string());
        debug!("Window {window:?} is now active");
        Ok(self.publish(&mut state))
    }

    /// Forgets `window`'s script sections. If it was active, the table falls
    /// back to the shared sections.
    pub fn close_window(&self, window: &str) -> Result<u64, RegistryError> {
        let mut state = self.lock_state();
        if state.is_shut_down {
            return Err(RegistryError::ShutDown);
        }
        state.windows.remove(window);
        if !state.is_active(window) {
            return Ok(state.version);
        }
        state.active_window = None;
        Ok(self.publish(&mut state))
    }

    /// Replaces the bindings loaded from the user's conf file.
    pub fn replace_user_conf(&self, mappings: Vec<KeyMapping>) -> Result<u64, RegistryError> {
        self.replace_section_mappings(DEFAULT_SECTION_NAME, mappings)
    }

    /// Replaces the contents of a shared section in every window.
    pub fn replace_section_mappings(
        &self,
        name: &str,
        mappings: Vec<KeyMapping>,
    ) -> Result<u64, RegistryError> {
        if !is_shared_section(name) {
            return Err(RegistryError::UnknownSection(name.to_string()));
        }
        self.update_shared(|stack| {
            stack.replace_section_mappings(name, mappings.clone());
        })
    }

    pub fn set_saved_filters(&self, filters: &[SavedFilter]) -> Result<u64, RegistryError> {
        let audio = saved_filters_section(FilterKind::Audio, filters);
        let video = saved_filters_section(FilterKind::Video, filters);
        self.update_shared(|stack| {
            stack.replace_section(audio.clone());
            stack.replace_section(video.clone());
        })
    }

    pub fn set_extension_menu_items(
        &self,
        items: &[ExtensionMenuItem],
    ) -> Result<u64, RegistryError> {
        let plugins = extension_menu_section(items);
        self.update_shared(|stack| {
            stack.replace_section(plugins.clone());
        })
    }

    /// `define-section` from the engine of `window`.
    pub fn define_section(
        &self,
        window: &str,
        section: InputSection,
    ) -> Result<u64, RegistryError> {
        if is_shared_section(section.name()) {
            return Err(RegistryError::ReservedSection(section.name().to_string()));
        }
        self.update_window(window, |stack| {
            stack.define_section(section);
            Ok(())
        })
    }

    /// `enable-section` from the engine of `window`.
    pub fn enable_section(
        &self,
        window: &str,
        name: &str,
        flags: EnableFlags,
    ) -> Result<u64, RegistryError> {
        self.update_window(window, |stack| {
            if stack.enable_section(name, flags) {
                Ok(())
            } else {
                Err(RegistryError::UnknownSection(name.to_string()))
            }
        })
    }

    /// `disable-section` from the engine of `window`. Disabling a section
    /// that is not defined is not an error.
    ///
    /// # Panics
    ///
    /// Panics if `name` is a shared section.
    pub fn disable_section(&self, window: &str, name: &str) -> Result<u64, RegistryError> {
        self.update_window(window, |stack| {
            stack.disable_section(name);
            Ok(())
        })
    }

    /// Drops every section and publishes an empty snapshot. Later mutations
    /// fail with [`RegistryError::ShutDown`].
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        if state.is_shut_down {
            return;
        }
        state.is_shut_down = true;
        state.shared.clear();
        state.windows.clear();
        state.active_window = None;
        state.version += 1;
        let version = state.version;
        self.current.store(Arc::new(ActiveBindings::empty(version)));
        self.notify(version);
        info!("Binding registry shut down at v{version}");
    }

    fn update_shared(
        &self,
        mutate: impl FnMut(&mut InputSectionStack),
    ) -> Result<u64, RegistryError> {
        let mut state = self.lock_state();
        if state.is_shut_down {
            return Err(RegistryError::ShutDown);
        }
        state.for_each_stack(mutate);
        Ok(self.publish(&mut state))
    }

    /// Mutates one window's stack. Only the active window's changes are
    /// published; others return the current version unchanged.
    fn update_window(
        &self,
        window: &str,
        mutate: impl FnOnce(&mut InputSectionStack) -> Result<(), RegistryError>,
    ) -> Result<u64, RegistryError> {
        let mut state = self.lock_state();
        if state.is_shut_down {
            return Err(RegistryError::ShutDown);
        }
        mutate(state.window_stack(window))?;
        if !state.is_active(window) {
            debug!("Window {window:?} is not active, skipping rebuild");
            return Ok(state.version);
        }
        Ok(self.publish(&mut state))
    }

    /// Rebuilds from the active stack, swaps the snapshot, then notifies.
    fn publish(&self, state: &mut RegistryState) -> u64 {
        state.version += 1;
        let version = state.version;
        let snapshot = ActiveBindingsBuilder::new(state.active_stack(), self.precedence.as_ref())
            .log_rebuild(self.settings.log_bindings_rebuild)
            .build(version);
        self.current.store(Arc::new(snapshot));
        self.notify(version);
        version
    }

    fn notify(&self, version: u64) {
        if self.changed_tx.send(BindingsChanged { version }).is_err() {
            debug!("No subscribers for bindings change v{version}");
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
