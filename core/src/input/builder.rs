//! Flattens the enabled sections of an [`InputSectionStack`] into a single
//! conflict-resolved table.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use tracing::debug;
use tracing::info;
use tracing::trace;

use crate::input::binding::InputBinding;
use crate::input::key_name::DEFAULT_BINDINGS_KEY;
use crate::input::key_name::MAX_KEY_SEQUENCE_LEN;
use crate::input::key_name::exceeds_max_sequence_len;
use crate::input::key_name::split_keystrokes;
use crate::input::mapping::KeyMapping;
use crate::input::section::DEFAULT_SECTION_NAME;
use crate::input::section::InputBindingOrigin;
use crate::input::section::InputSection;
use crate::input::section_stack::ActiveSection;
use crate::input::section_stack::InputSectionStack;

/// Orders competing force sections. A section that compares `Greater` wins
/// a key over one that compares `Less`.
pub trait ForcePrecedence: fmt::Debug + Send + Sync {
    fn compare(&self, a: &ActiveSection<'_>, b: &ActiveSection<'_>) -> Ordering;
}

/// The section enabled most recently wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnableOrder;

impl ForcePrecedence for EnableOrder {
    fn compare(&self, a: &ActiveSection<'_>, b: &ActiveSection<'_>) -> Ordering {
        a.stack_position.cmp(&b.stack_position)
    }
}

/// Normalized key to the binding that won it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingTable {
    entries: HashMap<String, InputBinding>,
}

impl BindingTable {
    pub fn get(&self, normalized_key: &str) -> Option<&InputBinding> {
        self.entries.get(normalized_key)
    }

    pub fn contains_key(&self, normalized_key: &str) -> bool {
        self.entries.contains_key(normalized_key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Incomplete prefixes of the bound key sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialSequenceIndex {
    prefixes: HashSet<String>,
}

impl PartialSequenceIndex {
    /// Computes the index from scratch. A prefix is included only when it is
    /// not itself a complete key in `table`.
    pub fn from_table(table: &BindingTable) -> Self {
        let mut prefixes = HashSet::new();
        for key in table.keys() {
            if key == DEFAULT_BINDINGS_KEY || !key.contains('-') {
                continue;
            }
            let chords = split_keystrokes(key);
            if !(2..=MAX_KEY_SEQUENCE_LEN).contains(&chords.len()) {
                continue;
            }
            let mut prefix = String::new();
            for chord in &chords[..chords.len() - 1] {
                if !prefix.is_empty() {
                    prefix.push('-');
                }
                prefix.push_str(chord);
                if !table.contains_key(&prefix) {
                    prefixes.insert(prefix.clone());
                }
            }
        }
        Self { prefixes }
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.prefixes.contains(candidate)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// Immutable result of one rebuild.
#[derive(Debug, Clone, Default)]
pub struct ActiveBindings {
    version: u64,
    candidates: Vec<InputBinding>,
    table: BindingTable,
    partials: PartialSequenceIndex,
    user_conf_range: Range<usize>,
}

impl ActiveBindings {
    pub fn empty(version: u64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Every binding from every active section, lowest priority first,
    /// including shadowed ones.
    pub fn candidates(&self) -> &[InputBinding] {
        &self.candidates
    }

    pub fn table(&self) -> &BindingTable {
        &self.table
    }

    pub fn partials(&self) -> &PartialSequenceIndex {
        &self.partials
    }

    /// Indices into [`Self::candidates`] occupied by the user's conf file.
    pub fn user_conf_range(&self) -> Range<usize> {
        self.user_conf_range.clone()
    }

    pub fn user_conf_bindings(&self) -> &[InputBinding] {
        &self.candidates[self.user_conf_range.clone()]
    }
}

pub struct ActiveBindingsBuilder<'a> {
    stack: &'a InputSectionStack,
    precedence: &'a dyn ForcePrecedence,
    log_rebuild: bool,
}

impl<'a> ActiveBindingsBuilder<'a> {
    pub fn new(stack: &'a InputSectionStack, precedence: &'a dyn ForcePrecedence) -> Self {
        Self {
            stack,
            precedence,
            log_rebuild: false,
        }
    }

    /// Dumps every examined binding at `debug` level.
    pub fn log_rebuild(mut self, enabled: bool) -> Self {
        self.log_rebuild = enabled;
        self
    }

    pub fn build(&self, version: u64) -> ActiveBindings {
        debug!("Starting rebuild of active bindings v{version}");

        let (candidates, user_conf_range) = self.combine_candidates();
        let (candidates, table) = resolve_conflicts(candidates);
        let partials = PartialSequenceIndex::from_table(&table);

        info!(
            "Finished rebuild of active bindings v{version} ({} bindings, {} partial sequences)",
            table.len(),
            partials.len()
        );
        if self.log_rebuild {
            let mut keys: Vec<&str> = table.keys().collect();
            keys.sort_unstable();
            for key in keys {
                if let Some(binding) = table.get(key) {
                    debug!(
                        "\t<{}> {key} -> {}",
                        binding.source_section(),
                        binding.mapping().readable_command()
                    );
                }
            }
        }

        ActiveBindings {
            version,
            candidates,
            table,
            partials,
            user_conf_range,
        }
    }

    /// Weak sections first in stack order, then force sections by ascending
    /// precedence. Later candidates win.
    fn combine_candidates(&self) -> (Vec<InputBinding>, Range<usize>) {
        let (mut force, weak): (Vec<ActiveSection<'_>>, Vec<ActiveSection<'_>>) = self
            .stack
            .active_sections()
            .into_iter()
            .partition(|active| active.section.is_force());
        force.sort_by(|a, b| self.precedence.compare(a, b));

        let mut candidates = Vec::new();
        let mut user_conf_range = 0..0;
        for active in weak.iter().chain(force.iter()) {
            let section = active.section;
            if section.is_empty() {
                if self.log_rebuild {
                    debug!("Skipping section {:?}: no bindings", section.name());
                }
                continue;
            }
            let start = candidates.len();
            candidates.extend(
                section
                    .authored()
                    .iter()
                    .map(|mapping| self.build_candidate(mapping, section)),
            );
            if section.origin() == InputBindingOrigin::ConfFile
                && section.name() == DEFAULT_SECTION_NAME
            {
                user_conf_range = start..candidates.len();
            }
            if self.log_rebuild {
                debug!(
                    "Added {} bindings from section {:?} (force={})",
                    candidates.len() - start,
                    section.name(),
                    section.is_force()
                );
            }
        }
        (candidates, user_conf_range)
    }

    /// Wraps one record, disabling records that cannot be honored.
    fn build_candidate(&self, mapping: &KeyMapping, section: &InputSection) -> InputBinding {
        let mut final_mapping = mapping.clone();
        let mut rejection = None;

        if mapping.raw_key() == DEFAULT_BINDINGS_KEY && mapping.command_tokens() == ["start"] {
            rejection =
                Some("reel does not support default-level (\"builtin\") bindings".to_string());
        } else if exceeds_max_sequence_len(mapping.raw_key()) {
            debug!(
                "Disabling binding for key {:?}: more than {MAX_KEY_SEQUENCE_LEN} keys",
                mapping.raw_key()
            );
            rejection = Some(format!(
                "Key sequences longer than {MAX_KEY_SEQUENCE_LEN} keys are not supported"
            ));
        } else if let Some(destination) = mapping.destination_section() {
            if destination == section.name() {
                trace!(
                    "Removing redundant section specifier {destination:?} for key {:?}",
                    mapping.raw_key()
                );
                final_mapping = mapping.without_destination_section();
            } else {
                debug!(
                    "Disabling binding for key {:?}: it targets section {destination:?}",
                    mapping.raw_key()
                );
                rejection =
                    Some("Adding bindings to other input sections is not supported".to_string());
            }
        }

        let menu_item = section.menu_item_for(final_mapping.normalized_key()).cloned();
        let mut binding = InputBinding::new(final_mapping, section.origin(), section.name())
            .with_menu_item(menu_item);
        if let Some(message) = rejection {
            binding.disable(message);
        }
        binding
    }
}

/// Picks one winner per key. Every loser is disabled with a message.
fn resolve_conflicts(mut candidates: Vec<InputBinding>) -> (Vec<InputBinding>, BindingTable) {
    let mut winners: HashMap<String, usize> = HashMap::new();
    for idx in 0..candidates.len() {
        if !candidates[idx].is_enabled() {
            continue;
        }
        let key = candidates[idx].mapping().normalized_key().to_string();
        if key.is_empty() {
            continue;
        }
        let winner_command = candidates[idx].mapping().readable_command();
        if let Some(prev) = winners.insert(key.clone(), idx) {
            let message = if candidates[prev].origin() == InputBindingOrigin::ExtensionMenu {
                format!(
                    "{key:?} is overridden by {winner_command:?}. \
                     Extensions must use key bindings which are not already in use."
                )
            } else {
                format!(
                    "This binding is overridden by another binding below it \
                     which also uses {key:?}"
                )
            };
            candidates[prev].disable(message);
        }
    }

    let entries = winners
        .into_iter()
        .map(|(key, idx)| (key, candidates[idx].clone()))
        .collect();
    (candidates, BindingTable { entries })
}
