//! Script dispatch
//!
//! Scripts are invoked once per phase per frame, in registration order. They
//! hold no state of their own (`&self` only): everything that must survive to
//! the next frame goes through the [`ScriptContext`] into the
//! [`ScriptStore`], so rollback captures it.

use crate::entity::{EntityCodec, EntityRegistry, EntityToken};
use crate::events::EventQueue;
use crate::simulation::SimulationWorld;
use crate::store::{EntityListSnapshot, ScriptStore};
use crate::value::ScriptValue;

/// Per-frame callback phases, run in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptPhase {
    PreUpdate,
    Update,
    PostUpdate,
}

impl ScriptPhase {
    pub const ALL: [ScriptPhase; 3] = [Self::PreUpdate, Self::Update, Self::PostUpdate];
}

/// A gameplay script
///
/// Every phase defaults to doing nothing. Errors are logged by the host and
/// do not stop other scripts.
pub trait Script<W: SimulationWorld> {
    /// Stable identifier, used as the store key (typically the script's asset path)
    fn id(&self) -> &str;

    fn pre_update(&self, _ctx: &mut ScriptContext<'_, W>) -> anyhow::Result<()> {
        Ok(())
    }

    fn update(&self, _ctx: &mut ScriptContext<'_, W>) -> anyhow::Result<()> {
        Ok(())
    }

    fn post_update(&self, _ctx: &mut ScriptContext<'_, W>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Everything a script may touch during one call
///
/// Borrowed for the duration of the call only; handles resolved through it
/// must not be kept across frames.
pub struct ScriptContext<'a, W: SimulationWorld> {
    script_id: &'a str,
    frame: i32,
    store: &'a mut ScriptStore,
    world: &'a mut W,
    inputs: &'a [W::Input],
    events: &'a [W::Event],
}

impl<'a, W: SimulationWorld> ScriptContext<'a, W> {
    pub fn new(
        script_id: &'a str,
        frame: i32,
        store: &'a mut ScriptStore,
        world: &'a mut W,
        inputs: &'a [W::Input],
        events: &'a [W::Event],
    ) -> Self {
        Self {
            script_id,
            frame,
            store,
            world,
            inputs,
            events,
        }
    }

    pub fn script_id(&self) -> &str {
        self.script_id
    }

    pub fn frame(&self) -> i32 {
        self.frame
    }

    pub fn inputs(&self) -> &[W::Input] {
        self.inputs
    }

    pub fn input(&self, player: usize) -> Option<&W::Input> {
        self.inputs.get(player)
    }

    /// Events drained for this frame, in the order the engine raised them
    pub fn events(&self) -> &[W::Event] {
        self.events
    }

    pub fn world(&self) -> &W {
        &*self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut *self.world
    }

    pub fn codec(&self) -> EntityCodec<'_, W> {
        EntityCodec::new(&*self.world)
    }

    pub fn token(&self, handle: W::Handle) -> EntityToken {
        self.world.token(handle)
    }

    /// This script's singleton state
    pub fn state(&mut self, default: &ScriptValue) -> &mut ScriptValue {
        self.store.get_or_init_script_state(self.script_id, default)
    }

    /// This script's state for an entity
    pub fn entity_state(&mut self, handle: W::Handle, default: &ScriptValue) -> &mut ScriptValue {
        let token = self.world.token(handle);
        self.store
            .get_or_init_entity_state(self.script_id, token, default)
    }

    /// Overwrite or (with `None`) remove this script's state for an entity
    pub fn set_entity_state(&mut self, handle: W::Handle, value: Option<ScriptValue>) {
        let token = self.world.token(handle);
        self.store.set_entity_state(self.script_id, token, value);
    }

    /// Live handles in a list; entities that no longer exist are skipped
    pub fn entity_list(&self, name: &str) -> Vec<W::Handle> {
        let tokens = self.store.list_get(self.script_id, name);
        self.codec().resolve_all(&tokens)
    }

    /// Raw tokens in a list, including entities that no longer exist
    pub fn entity_list_tokens(&self, name: &str) -> EntityListSnapshot {
        self.store.list_get(self.script_id, name)
    }

    pub fn add_entity_to_list(&mut self, name: &str, handle: W::Handle) {
        let token = self.world.token(handle);
        self.store.list_append(self.script_id, name, token);
    }

    pub fn entity_list_contains(&self, name: &str, handle: W::Handle) -> bool {
        let token = self.world.token(handle);
        self.store.list_contains(self.script_id, name, token)
    }

    pub fn remove_entity_from_list(&mut self, name: &str, handle: W::Handle) {
        let token = self.world.token(handle);
        self.remove_token_from_list(name, token);
    }

    /// Remove a token even if its entity has already been despawned
    pub fn remove_token_from_list(&mut self, name: &str, token: EntityToken) {
        self.store.list_remove(self.script_id, name, token);
    }

    pub fn clear_entity_list(&mut self, name: &str) {
        self.store.list_clear(self.script_id, name);
    }
}

/// Script registration failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("script id '{0}' is already registered")]
    DuplicateId(String),
}

/// Runs registered scripts in a fixed order
pub struct ScriptHost<W: SimulationWorld> {
    scripts: Vec<Box<dyn Script<W>>>,
}

impl<W: SimulationWorld> ScriptHost<W> {
    pub fn new() -> Self {
        Self {
            scripts: Vec::new(),
        }
    }

    /// Register a script; it runs after every script registered before it
    pub fn register(&mut self, script: impl Script<W> + 'static) -> Result<(), ScriptError> {
        if self.scripts.iter().any(|s| s.id() == script.id()) {
            return Err(ScriptError::DuplicateId(script.id().to_owned()));
        }
        self.scripts.push(Box::new(script));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.scripts.iter().map(|s| s.id())
    }

    /// Run every phase of every script for one frame
    ///
    /// Drains `events` first so all scripts see the same ordered batch.
    /// Returns the number of script calls that failed.
    pub fn run_frame(
        &self,
        frame: i32,
        store: &mut ScriptStore,
        world: &mut W,
        inputs: &[W::Input],
        events: &mut EventQueue<W::Event>,
    ) -> usize {
        let events = events.drain();
        let mut failures = 0;

        for phase in ScriptPhase::ALL {
            for script in &self.scripts {
                let mut ctx = ScriptContext::new(
                    script.id(),
                    frame,
                    &mut *store,
                    &mut *world,
                    inputs,
                    &events,
                );
                let result = match phase {
                    ScriptPhase::PreUpdate => script.pre_update(&mut ctx),
                    ScriptPhase::Update => script.update(&mut ctx),
                    ScriptPhase::PostUpdate => script.post_update(&mut ctx),
                };
                if let Err(e) = result {
                    failures += 1;
                    tracing::error!(
                        "Script '{}' failed in {:?} at frame {}: {:#}",
                        script.id(),
                        phase,
                        frame,
                        e
                    );
                }
            }
        }

        failures
    }
}

impl<W: SimulationWorld> Default for ScriptHost<W> {
    fn default() -> Self {
        Self::new()
    }
}
