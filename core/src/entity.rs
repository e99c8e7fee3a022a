//! Stable entity identity
//!
//! Engine entity handles are recycled across spawns, so a handle captured in
//! frame N may name a different entity after a rollback and replay. Scripts
//! therefore persist [`EntityToken`]s, which are tied to the engine's
//! generational identity, and re-resolve them every frame through an
//! [`EntityCodec`].

use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::remap::RemapTable;

/// Stable, serializable identity of a simulation entity
///
/// A fixed-size `(index, generation)` pair. Tokens are compared, never
/// interpreted by scripts, and are only replaced through an explicit remap.
#[repr(C)]
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Pod,
    Zeroable,
    Serialize,
    Deserialize,
)]
pub struct EntityToken {
    /// Engine slot index
    pub index: u32,
    /// Generation of the slot when the entity was spawned
    pub generation: u32,
}

impl EntityToken {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Debug for EntityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityToken({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for EntityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Engine-side entity lookup
///
/// Implemented by the simulation engine. `token` must be a pure function of
/// the entity's generational identity, never of raw handle bits.
pub trait EntityRegistry {
    /// Engine-native entity handle
    type Handle: Copy + Eq;

    /// Stable token for a live handle
    fn token(&self, handle: Self::Handle) -> EntityToken;

    /// Resolve a token against the current engine state
    ///
    /// Returns `None` if the entity has been despawned or its slot reused.
    fn resolve(&self, token: EntityToken) -> Option<Self::Handle>;
}

/// Frame-scoped conversion between engine handles and tokens
///
/// Borrows the registry, so handles obtained through it cannot outlive the
/// current script invocation.
pub struct EntityCodec<'w, R: EntityRegistry> {
    registry: &'w R,
}

impl<'w, R: EntityRegistry> EntityCodec<'w, R> {
    pub fn new(registry: &'w R) -> Self {
        Self { registry }
    }

    /// Token for a live handle (idempotent within a frame)
    pub fn to_token(&self, handle: R::Handle) -> EntityToken {
        self.registry.token(handle)
    }

    /// Resolve a token, `None` meaning the entity no longer exists
    pub fn from_token(&self, token: EntityToken) -> Option<R::Handle> {
        self.registry.resolve(token)
    }

    pub fn is_alive(&self, token: EntityToken) -> bool {
        self.registry.resolve(token).is_some()
    }

    /// Resolve a list of tokens, skipping entities that no longer exist
    pub fn resolve_all<'t>(
        &self,
        tokens: impl IntoIterator<Item = &'t EntityToken>,
    ) -> Vec<R::Handle> {
        tokens
            .into_iter()
            .filter_map(|token| self.registry.resolve(*token))
            .collect()
    }

    /// Translate a token held outside the store across a remap
    ///
    /// Returns `None` if the table drops the entity.
    pub fn remap_token(&self, table: &RemapTable, token: EntityToken) -> Option<EntityToken> {
        table.get(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestWorld;

    #[test]
    fn test_token_ordering_is_index_then_generation() {
        assert!(EntityToken::new(1, 9) < EntityToken::new(2, 0));
        assert!(EntityToken::new(1, 0) < EntityToken::new(1, 1));
    }

    #[test]
    fn test_token_is_fixed_size_pair() {
        let token = EntityToken::new(0x0102_0304, 7);
        let bytes = bytemuck::bytes_of(&token);
        assert_eq!(bytes.len(), 8);
        let back: &EntityToken = bytemuck::from_bytes(bytes);
        assert_eq!(*back, token);
    }

    #[test]
    fn test_codec_round_trip_live_entity() {
        let mut world = TestWorld::new(1);
        let handle = world.spawn(10);
        let codec = EntityCodec::new(&world);

        let token = codec.to_token(handle);
        assert_eq!(codec.to_token(handle), token);
        assert_eq!(codec.from_token(token), Some(handle));
    }

    #[test]
    fn test_codec_not_found_after_slot_reuse() {
        let mut world = TestWorld::new(1);
        let old = world.spawn(1);
        let old_token = world.token(old);
        world.despawn(old);

        // Same slot, new generation
        let new = world.spawn(2);
        let codec = EntityCodec::new(&world);
        assert_eq!(codec.to_token(new).index, old_token.index);
        assert_ne!(codec.to_token(new), old_token);
        assert_eq!(codec.from_token(old_token), None);
        assert!(!codec.is_alive(old_token));
    }

    #[test]
    fn test_resolve_all_skips_dead() {
        let mut world = TestWorld::new(1);
        let a = world.spawn(1);
        let b = world.spawn(2);
        let tokens = [world.token(a), world.token(b)];
        world.despawn(a);

        let codec = EntityCodec::new(&world);
        assert_eq!(codec.resolve_all(&tokens), vec![b]);
    }
}
