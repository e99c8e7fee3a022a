//! Keyed state store for script-owned data
//!
//! A single [`ScriptStore`] holds everything scripts persist between frames:
//!
//! - per-script singleton state
//! - per-(script, entity) state
//! - named entity lists per script
//!
//! The store is plain data. It is owned by the simulation loop, handed to
//! scripts for the duration of one call, and captured whole into every
//! rollback snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityToken;
use crate::value::ScriptValue;

mod encoding;
mod lists;
mod remap;


pub use encoding::{STORE_HEADER_SIZE, STORE_MAGIC, STORE_VERSION, StoreError};
pub use lists::EntityListSnapshot;

/// Script-owned persistent state
///
/// Every map is ordered, so iteration, encoding, and checksums are identical
/// on all peers given the same sequence of operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptStore {
    /// Singleton state per script id
    script: BTreeMap<String, ScriptValue>,
    /// Entity state per script id, keyed by entity token
    entity: BTreeMap<String, BTreeMap<EntityToken, ScriptValue>>,
    /// Named entity lists per script id
    lists: BTreeMap<String, BTreeMap<String, Vec<EntityToken>>>,
}

impl ScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no script has stored anything
    pub fn is_empty(&self) -> bool {
        self.script.is_empty() && self.entity.is_empty() && self.lists.is_empty()
    }

    /// Drop all state (session teardown)
    pub fn clear(&mut self) {
        self.script.clear();
        self.entity.clear();
        self.lists.clear();
    }

    // ------------------------------------------------------------------------
    // Script state
    // ------------------------------------------------------------------------

    /// Get a script's singleton state, installing a copy of `default` first
    /// if the script has none
    ///
    /// The returned reference points into the store; `default` itself is
    /// never aliased.
    pub fn get_or_init_script_state(
        &mut self,
        script: &str,
        default: &ScriptValue,
    ) -> &mut ScriptValue {
        self.script
            .entry(script.to_owned())
            .or_insert_with(|| default.clone())
    }

    pub fn script_state(&self, script: &str) -> Option<&ScriptValue> {
        self.script.get(script)
    }

    pub fn set_script_state(&mut self, script: &str, value: ScriptValue) {
        self.script.insert(script.to_owned(), value);
    }

    // ------------------------------------------------------------------------
    // Entity state
    // ------------------------------------------------------------------------

    /// Get the state a script keeps for an entity, installing a copy of
    /// `default` on first access
    ///
    /// After the first access `default` is ignored.
    pub fn get_or_init_entity_state(
        &mut self,
        script: &str,
        token: EntityToken,
        default: &ScriptValue,
    ) -> &mut ScriptValue {
        self.entity
            .entry(script.to_owned())
            .or_default()
            .entry(token)
            .or_insert_with(|| default.clone())
    }

    pub fn entity_state(&self, script: &str, token: EntityToken) -> Option<&ScriptValue> {
        self.entity.get(script)?.get(&token)
    }

    /// Overwrite a script's state for an entity
    ///
    /// `None` removes the entry entirely, so the next
    /// [`get_or_init_entity_state`](Self::get_or_init_entity_state) starts
    /// from the default again. Used on despawn.
    pub fn set_entity_state(
        &mut self,
        script: &str,
        token: EntityToken,
        value: Option<ScriptValue>,
    ) {
        match value {
            Some(value) => {
                self.entity
                    .entry(script.to_owned())
                    .or_default()
                    .insert(token, value);
            }
            None => {
                let Some(states) = self.entity.get_mut(script) else {
                    return;
                };
                states.remove(&token);
                if states.is_empty() {
                    self.entity.remove(script);
                }
            }
        }
    }

    /// All entity states of a script, in token order
    pub fn entity_states(
        &self,
        script: &str,
    ) -> impl Iterator<Item = (EntityToken, &ScriptValue)> + '_ {
        self.entity
            .get(script)
            .into_iter()
            .flat_map(|states| states.iter().map(|(token, value)| (*token, value)))
    }

    /// Number of entity states held across all scripts
    pub fn entity_state_count(&self) -> usize {
        self.entity.values().map(BTreeMap::len).sum()
    }
}
