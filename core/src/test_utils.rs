//! Shared test utilities for integration and unit tests

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::entity::{EntityRegistry, EntityToken};
use crate::events::EventQueue;
use crate::remap::RemapTable;
use crate::rollback::{FrameInput, RollbackEngine};
use crate::script::{Script, ScriptContext, ScriptHost};
use crate::simulation::SimulationWorld;
use crate::store::ScriptStore;
use crate::value::ScriptValue;

// ============================================================================
// Test World Implementation
// ============================================================================

/// Handle to an entity in a [`TestWorld`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TestHandle {
    index: u32,
    generation: u32,
}

/// How a [`TestWorld`] recreates entities when loading state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RestoreMode {
    /// Entities come back under their saved tokens
    #[default]
    Exact,
    /// Entities come back under new generations, so every token changes
    Reshuffle,
    /// The reported table sends the last saved entity onto the first one's
    /// token and leaves the first unmapped
    Alias,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Body {
    /// Position in spawn order; stable across restores
    spawn_seq: u64,
    value: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct WorldState {
    slots: Vec<Slot>,
    free: Vec<u32>,
    next_spawn_seq: u64,
    rng_state: u64,
}

/// Generational-index engine for tests
///
/// Despawned slots are reused with a bumped generation. Stepping adds a
/// pseudo-random amount to every body and raises a milestone event when a
/// body's value lands on a multiple of 7.
#[derive(Debug)]
pub struct TestWorld {
    state: WorldState,
    restore_mode: RestoreMode,
    fail_next_load: bool,
}

impl TestWorld {
    pub fn new(seed: u64) -> Self {
        Self {
            state: WorldState {
                rng_state: seed,
                ..Default::default()
            },
            restore_mode: RestoreMode::Exact,
            fail_next_load: false,
        }
    }

    pub fn with_restore_mode(mut self, mode: RestoreMode) -> Self {
        self.restore_mode = mode;
        self
    }

    /// Make the next `load_state` call fail
    pub fn fail_next_load(&mut self) {
        self.fail_next_load = true;
    }

    /// Spawn an entity, reusing the most recently freed slot
    pub fn spawn(&mut self, value: i64) -> TestHandle {
        let body = Body {
            spawn_seq: self.state.next_spawn_seq,
            value,
        };
        self.state.next_spawn_seq += 1;

        let index = match self.state.free.pop() {
            Some(index) => index,
            None => {
                self.state.slots.push(Slot::default());
                (self.state.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.state.slots[index as usize];
        slot.body = Some(body);
        TestHandle {
            index,
            generation: slot.generation,
        }
    }

    /// Despawn a live entity; false if the handle is stale
    pub fn despawn(&mut self, handle: TestHandle) -> bool {
        if self.body(handle).is_none() {
            return false;
        }
        let slot = &mut self.state.slots[handle.index as usize];
        slot.body = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.state.free.push(handle.index);
        true
    }

    pub fn value(&self, handle: TestHandle) -> Option<i64> {
        self.body(handle).map(|body| body.value)
    }

    pub fn spawn_seq(&self, handle: TestHandle) -> Option<u64> {
        self.body(handle).map(|body| body.spawn_seq)
    }

    /// Live entities in slot order
    pub fn handles(&self) -> Vec<TestHandle> {
        self.state
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.body.is_some())
            .map(|(index, slot)| TestHandle {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.state.slots.iter().filter(|s| s.body.is_some()).count()
    }

    /// `(spawn_seq, value)` for every live entity, ordered by spawn
    ///
    /// Independent of tokens, so worlds restored in different modes compare
    /// equal when they hold the same entities.
    pub fn canonical(&self) -> (Vec<(u64, i64)>, u64, u64) {
        let mut bodies: Vec<(u64, i64)> = self
            .state
            .slots
            .iter()
            .filter_map(|slot| slot.body.as_ref())
            .map(|body| (body.spawn_seq, body.value))
            .collect();
        bodies.sort_unstable();
        (bodies, self.state.next_spawn_seq, self.state.rng_state)
    }

    /// Table mapping every live token to `EntityToken::new(spawn_seq, 0)`
    pub fn canonical_table(&self) -> RemapTable {
        let mut table = RemapTable::new();
        for handle in self.handles() {
            if let Some(seq) = self.spawn_seq(handle) {
                table
                    .insert(self.token(handle), EntityToken::new(seq as u32, 0))
                    .expect("live tokens are unique");
            }
        }
        table
    }

    /// Generate a deterministic random u32 using PCG
    pub fn random(&mut self) -> u32 {
        const MULTIPLIER: u64 = 6364136223846793005;
        const INCREMENT: u64 = 1442695040888963407;
        let old_state = self.state.rng_state;
        self.state.rng_state = old_state
            .wrapping_mul(MULTIPLIER)
            .wrapping_add(INCREMENT);
        let xor_shifted = (((old_state >> 18) ^ old_state) >> 27) as u32;
        let rot = (old_state >> 59) as u32;
        xor_shifted.rotate_right(rot)
    }

    fn body(&self, handle: TestHandle) -> Option<&Body> {
        let slot = self.state.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.body.as_ref()
    }

    fn keyed_tokens(state: &WorldState) -> Vec<(u64, EntityToken)> {
        state
            .slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| {
                let body = slot.body.as_ref()?;
                Some((body.spawn_seq, EntityToken::new(index as u32, slot.generation)))
            })
            .collect()
    }
}

impl EntityRegistry for TestWorld {
    type Handle = TestHandle;

    fn token(&self, handle: TestHandle) -> EntityToken {
        EntityToken::new(handle.index, handle.generation)
    }

    fn resolve(&self, token: EntityToken) -> Option<TestHandle> {
        let handle = TestHandle {
            index: token.index,
            generation: token.generation,
        };
        self.body(handle).map(|_| handle)
    }
}

impl RollbackEngine for TestWorld {
    fn save_state(&self, buffer: &mut Vec<u8>) -> anyhow::Result<()> {
        bincode::serialize_into(buffer, &self.state)?;
        Ok(())
    }

    fn load_state(&mut self, data: &[u8]) -> anyhow::Result<RemapTable> {
        if std::mem::take(&mut self.fail_next_load) {
            anyhow::bail!("injected load failure");
        }
        let saved: WorldState = bincode::deserialize(data)?;
        let before = Self::keyed_tokens(&saved);

        let mut restored = saved;
        if self.restore_mode == RestoreMode::Reshuffle {
            for slot in &mut restored.slots {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        let after = Self::keyed_tokens(&restored);
        self.state = restored;

        let table = match self.restore_mode {
            RestoreMode::Exact => RemapTable::identity(before.into_iter().map(|(_, token)| token)),
            RestoreMode::Reshuffle => RemapTable::from_entity_sets(before, after)?,
            RestoreMode::Alias => {
                let mut table = RemapTable::new();
                if let (Some(&(_, target)), [_, .., (_, last)]) =
                    (after.first(), before.as_slice())
                {
                    table.insert(*last, target)?;
                }
                table
            }
        };
        Ok(table)
    }
}

impl SimulationWorld for TestWorld {
    type Input = TestInput;
    type Event = TestEvent;

    fn step(&mut self, _frame: i32, _inputs: &[TestInput], events: &mut EventQueue<TestEvent>) {
        for handle in self.handles() {
            let delta = 1 + (self.random() % 3) as i64;
            let slot = &mut self.state.slots[handle.index as usize];
            if let Some(body) = slot.body.as_mut() {
                body.value += delta;
                if body.value % 7 == 0 {
                    events.push(TestEvent::Milestone(EntityToken::new(
                        handle.index,
                        handle.generation,
                    )));
                }
            }
        }
    }
}

/// Test input type
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Debug, Pod, Zeroable, Serialize, Deserialize)]
pub struct TestInput {
    pub buttons: u16,
    pub x: i8,
    pub y: i8,
}

impl FrameInput for TestInput {}

impl TestInput {
    pub const SPAWN: u16 = 1;

    pub fn pressing(buttons: u16) -> Self {
        Self {
            buttons,
            ..Default::default()
        }
    }
}

/// Event raised by [`TestWorld::step`]
#[derive(Clone, Debug, PartialEq)]
pub enum TestEvent {
    /// A body's value reached a multiple of 7
    Milestone(EntityToken),
}

// ============================================================================
// Test Scripts
// ============================================================================

/// Spawns entities on input or at random and despawns them after a while
///
/// Keeps every spawned entity in its `spawned` list, an `age` per entity, and
/// links each entity to the one spawned after it through `next`.
pub struct Spawner;

/// Frames an entity spawned by [`Spawner`] lives
pub const SPAWNER_LIFETIME: i64 = 5;

impl Script<TestWorld> for Spawner {
    fn id(&self) -> &str {
        "scripts/spawner.lua"
    }

    fn update(&self, ctx: &mut ScriptContext<'_, TestWorld>) -> anyhow::Result<()> {
        let pressed = ctx
            .inputs()
            .iter()
            .any(|input| input.buttons & TestInput::SPAWN != 0);
        if !pressed && ctx.world_mut().random() % 4 != 0 {
            return Ok(());
        }

        let handle = ctx.world_mut().spawn(0);
        let token = ctx.token(handle);
        if let Some(&previous) = ctx.entity_list("spawned").last() {
            let default = ScriptValue::map();
            ctx.entity_state(previous, &default).insert("next", token);
        }
        ctx.add_entity_to_list("spawned", handle);
        ctx.entity_state(handle, &ScriptValue::from(json!({ "age": 0 })));

        let state = ctx.state(&ScriptValue::from(json!({ "spawned_total": 0 })));
        let total = state.get("spawned_total").and_then(ScriptValue::as_i64).unwrap_or(0);
        state.insert("spawned_total", total + 1);
        Ok(())
    }

    fn post_update(&self, ctx: &mut ScriptContext<'_, TestWorld>) -> anyhow::Result<()> {
        let default = ScriptValue::from(json!({ "age": 0 }));
        for handle in ctx.entity_list("spawned") {
            let state = ctx.entity_state(handle, &default);
            let age = state.get("age").and_then(ScriptValue::as_i64).unwrap_or(0) + 1;
            state.insert("age", age);
            if age > SPAWNER_LIFETIME {
                ctx.set_entity_state(handle, None);
                ctx.remove_entity_from_list("spawned", handle);
                ctx.world_mut().despawn(handle);
            }
        }
        Ok(())
    }
}

/// Counts milestone events
pub struct Scorer;

impl Script<TestWorld> for Scorer {
    fn id(&self) -> &str {
        "scripts/score.lua"
    }

    fn pre_update(&self, ctx: &mut ScriptContext<'_, TestWorld>) -> anyhow::Result<()> {
        let milestones = ctx
            .events()
            .iter()
            .filter(|event| matches!(event, TestEvent::Milestone(_)))
            .count() as i64;
        let state = ctx.state(&ScriptValue::from(json!({ "score": 0 })));
        let score = state.get("score").and_then(ScriptValue::as_i64).unwrap_or(0);
        state.insert("score", score + milestones);
        Ok(())
    }
}

/// Host running [`Spawner`] then [`Scorer`]
pub fn test_host() -> ScriptHost<TestWorld> {
    let mut host = ScriptHost::new();
    host.register(Spawner).expect("unique script id");
    host.register(Scorer).expect("unique script id");
    host
}

/// Store with every token rewritten to its spawn-order canonical form
pub fn canonical_store(store: &ScriptStore, world: &TestWorld) -> ScriptStore {
    let (canonical, _) = store
        .remapped(&world.canonical_table(), crate::remap::UnmappedPolicy::Keep)
        .expect("canonical tokens are unique");
    canonical
}
