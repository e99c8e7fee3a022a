//! Named entity lists
//!
//! Scripts track the entities they spawned in lists of tokens rather than raw
//! handles, since handles do not keep their identity across rollback.
//! Duplicates are kept; the store never deduplicates on its own.

use smallvec::SmallVec;

use crate::entity::EntityToken;

use super::ScriptStore;

/// Copy of a list's contents at the time of the call
///
/// Inline for the common case of a handful of entities.
pub type EntityListSnapshot = SmallVec<[EntityToken; 8]>;

impl ScriptStore {
    pub fn list_append(&mut self, script: &str, list: &str, token: EntityToken) {
        self.list_mut(script, list).push(token);
    }

    /// Snapshot of a list
    ///
    /// Mutating the list while iterating the result does not affect the
    /// iteration. Unknown lists read as empty.
    pub fn list_get(&self, script: &str, list: &str) -> EntityListSnapshot {
        self.list(script, list)
            .map(|tokens| SmallVec::from_slice(tokens))
            .unwrap_or_default()
    }

    pub fn list_clear(&mut self, script: &str, list: &str) {
        self.list_mut(script, list).clear();
    }

    /// Remove every occurrence of `token`, returning how many were removed
    pub fn list_remove(&mut self, script: &str, list: &str, token: EntityToken) -> usize {
        let Some(tokens) = self.lists.get_mut(script).and_then(|lists| lists.get_mut(list))
        else {
            return 0;
        };
        let before = tokens.len();
        tokens.retain(|t| *t != token);
        before - tokens.len()
    }

    pub fn list_contains(&self, script: &str, list: &str, token: EntityToken) -> bool {
        self.list(script, list)
            .is_some_and(|tokens| tokens.contains(&token))
    }

    /// Replace a list's contents wholesale
    pub fn list_replace(
        &mut self,
        script: &str,
        list: &str,
        tokens: impl IntoIterator<Item = EntityToken>,
    ) {
        let current = self.list_mut(script, list);
        current.clear();
        current.extend(tokens);
    }

    pub fn list_len(&self, script: &str, list: &str) -> usize {
        self.list(script, list).map_or(0, Vec::len)
    }

    /// Names of a script's lists, in order
    pub fn list_names(&self, script: &str) -> impl Iterator<Item = &str> + '_ {
        self.lists
            .get(script)
            .into_iter()
            .flat_map(|lists| lists.keys().map(String::as_str))
    }

    fn list(&self, script: &str, list: &str) -> Option<&Vec<EntityToken>> {
        self.lists.get(script)?.get(list)
    }

    fn list_mut(&mut self, script: &str, list: &str) -> &mut Vec<EntityToken> {
        self.lists
            .entry(script.to_owned())
            .or_default()
            .entry(list.to_owned())
            .or_default()
    }
}
