//! Entity remapping after rollback and replay
//!
//! When the engine restores an older frame it may recreate entities under
//! different tokens. It reports the correspondence as a [`RemapTable`], which
//! the [`ScriptStore`](crate::ScriptStore) applies to every token it holds.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::entity::EntityToken;

/// What to do with stored tokens the remap table does not mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedPolicy {
    /// Treat the entity as despawned: drop its state and list entries
    #[default]
    Despawned,
    /// Leave the token unchanged
    Keep,
}

/// Ordered `old -> new` token correspondence
///
/// Injective: no two sources share a target, so distinct entities never merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapTable {
    pairs: Vec<(EntityToken, EntityToken)>,
    index: HashMap<EntityToken, EntityToken>,
    targets: HashMap<EntityToken, EntityToken>,
}

impl RemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity table over the given tokens
    pub fn identity(tokens: impl IntoIterator<Item = EntityToken>) -> Self {
        let mut table = Self::new();
        for token in tokens {
            // Identity pairs cannot conflict
            let _ = table.insert(token, token);
        }
        table
    }

    /// Build a table by matching entities on a stable spawn key
    ///
    /// `before` and `after` pair each live entity with a key that the engine
    /// reproduces deterministically on replay (spawn sequence number, network
    /// id, ...). Entities only present in `before` are left out, meaning
    /// despawned. A key used twice on the same side is rejected.
    pub fn from_entity_sets<K: Ord>(
        before: impl IntoIterator<Item = (K, EntityToken)>,
        after: impl IntoIterator<Item = (K, EntityToken)>,
    ) -> Result<Self, RemapError> {
        let before = keyed(before)?;
        let after = keyed(after)?;
        let mut table = Self::new();
        for (key, old) in before {
            if let Some(new) = after.get(&key) {
                table.insert(old, *new)?;
            }
        }
        Ok(table)
    }

    /// Add a pair
    ///
    /// Re-adding an identical pair is a no-op. Mapping one source to two
    /// targets, or two sources to one target, is an integrity failure.
    pub fn insert(&mut self, old: EntityToken, new: EntityToken) -> Result<(), RemapError> {
        match self.index.get(&old) {
            Some(existing) if *existing == new => return Ok(()),
            Some(existing) => {
                return Err(RemapError::ConflictingSource {
                    token: old,
                    first: *existing,
                    second: new,
                });
            }
            None => {}
        }
        if let Some(source) = self.targets.get(&new) {
            return Err(RemapError::ConflictingTarget {
                target: new,
                first: *source,
                second: old,
            });
        }
        self.index.insert(old, new);
        self.targets.insert(new, old);
        self.pairs.push((old, new));
        Ok(())
    }

    /// Target for `old`, if mapped
    pub fn get(&self, old: EntityToken) -> Option<EntityToken> {
        self.index.get(&old).copied()
    }

    /// Source mapped onto `new`, if any
    pub fn source_of(&self, new: EntityToken) -> Option<EntityToken> {
        self.targets.get(&new).copied()
    }

    /// Apply `policy` to a token
    pub fn translate(&self, old: EntityToken, policy: UnmappedPolicy) -> Option<EntityToken> {
        match (self.get(old), policy) {
            (Some(new), _) => Some(new),
            (None, UnmappedPolicy::Keep) => Some(old),
            (None, UnmappedPolicy::Despawned) => None,
        }
    }

    /// True if every pair maps a token to itself
    pub fn is_identity(&self) -> bool {
        self.pairs.iter().all(|(old, new)| old == new)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (EntityToken, EntityToken)> + '_ {
        self.pairs.iter().copied()
    }
}

fn keyed<K: Ord>(
    entities: impl IntoIterator<Item = (K, EntityToken)>,
) -> Result<BTreeMap<K, EntityToken>, RemapError> {
    let mut keyed = BTreeMap::new();
    for (key, token) in entities {
        if let Some(first) = keyed.insert(key, token) {
            return Err(RemapError::DuplicateKey {
                first,
                second: token,
            });
        }
    }
    Ok(keyed)
}

/// Counters reported by [`ScriptStore::remap_all`](crate::ScriptStore::remap_all)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemapStats {
    /// Tokens rewritten to a different token
    pub remapped: usize,
    /// Entity states removed because their entity is gone
    pub dropped_states: usize,
    /// List entries removed because their entity is gone
    pub dropped_list_entries: usize,
    /// Entity references inside values cleared to `Null`
    pub cleared_references: usize,
}

/// Remap integrity failure
///
/// These indicate a broken engine/coordinator contract; the rollback attempt
/// must fail as a whole.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemapError {
    #[error("remap table maps {token} to both {first} and {second}")]
    ConflictingSource {
        token: EntityToken,
        first: EntityToken,
        second: EntityToken,
    },

    #[error("remap table maps both {first} and {second} onto {target}")]
    ConflictingTarget {
        target: EntityToken,
        first: EntityToken,
        second: EntityToken,
    },

    #[error("entities {first} and {second} share a remap key")]
    DuplicateKey {
        first: EntityToken,
        second: EntityToken,
    },

    /// A kept, unmapped token is also the target of another entity
    #[error("remap merges {from} into {to} in script '{script}'")]
    Collision {
        script: String,
        from: EntityToken,
        to: EntityToken,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(index: u32, generation: u32) -> EntityToken {
        EntityToken::new(index, generation)
    }

    #[test]
    fn test_insert_duplicate_pair_is_noop() {
        let mut table = RemapTable::new();
        table.insert(t(1, 0), t(2, 0)).unwrap();
        table.insert(t(1, 0), t(2, 0)).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_insert_conflicting_source() {
        let mut table = RemapTable::new();
        table.insert(t(1, 0), t(2, 0)).unwrap();
        let err = table.insert(t(1, 0), t(3, 0)).unwrap_err();
        assert!(matches!(err, RemapError::ConflictingSource { .. }));
    }

    #[test]
    fn test_insert_conflicting_target() {
        let mut table = RemapTable::new();
        table.insert(t(1, 0), t(5, 0)).unwrap();
        let err = table.insert(t(2, 0), t(5, 0)).unwrap_err();
        assert_eq!(
            err,
            RemapError::ConflictingTarget {
                target: t(5, 0),
                first: t(1, 0),
                second: t(2, 0),
            }
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.source_of(t(5, 0)), Some(t(1, 0)));
    }

    #[test]
    fn test_from_entity_sets_rejects_duplicate_keys() {
        let err = RemapTable::from_entity_sets(
            vec![(1u64, t(0, 0)), (2, t(1, 0))],
            vec![(1u64, t(0, 1)), (1, t(1, 1))],
        )
        .unwrap_err();
        assert_eq!(
            err,
            RemapError::DuplicateKey {
                first: t(0, 1),
                second: t(1, 1),
            }
        );

        let err = RemapTable::from_entity_sets(
            vec![(3u64, t(0, 0)), (3, t(1, 0))],
            vec![(3u64, t(0, 1))],
        )
        .unwrap_err();
        assert!(matches!(err, RemapError::DuplicateKey { .. }));
    }

    #[test]
    fn test_translate_policies() {
        let mut table = RemapTable::new();
        table.insert(t(1, 0), t(4, 1)).unwrap();

        assert_eq!(table.translate(t(1, 0), UnmappedPolicy::Despawned), Some(t(4, 1)));
        assert_eq!(table.translate(t(9, 0), UnmappedPolicy::Despawned), None);
        assert_eq!(table.translate(t(9, 0), UnmappedPolicy::Keep), Some(t(9, 0)));
    }

    #[test]
    fn test_from_entity_sets_matches_keys() {
        let before = vec![(10u64, t(0, 0)), (11, t(1, 0)), (12, t(2, 0))];
        let after = vec![(11u64, t(0, 1)), (10, t(1, 1))];

        let table = RemapTable::from_entity_sets(before, after).unwrap();
        assert_eq!(table.get(t(0, 0)), Some(t(1, 1)));
        assert_eq!(table.get(t(1, 0)), Some(t(0, 1)));
        // Key 12 was not recreated
        assert_eq!(table.get(t(2, 0)), None);
        assert!(!table.is_identity());
    }

    #[test]
    fn test_identity_table() {
        let table = RemapTable::identity([t(0, 0), t(3, 2)]);
        assert!(table.is_identity());
        assert_eq!(table.iter().count(), 2);
    }
}
