//! Frame-stepped simulation loop
//!
//! Owns the [`ScriptStore`], the engine world, and the script host, and
//! advances them together one frame at a time:
//!
//! 1. the engine steps and raises events
//! 2. scripts run (`pre_update`, `update`, `post_update`)
//! 3. the frame counter advances
//!
//! Saving and rolling back are driven from outside through a
//! [`RollbackStateManager`](crate::rollback::RollbackStateManager).

use crate::entity::EntityRegistry;
use crate::events::EventQueue;
use crate::remap::RemapStats;
use crate::rollback::{
    LoadStateError, RollbackEngine, RollbackStateManager, SaveStateError, SnapshotRef,
};
use crate::script::ScriptHost;
use crate::store::ScriptStore;

/// The engine side of a simulation
pub trait SimulationWorld: EntityRegistry + RollbackEngine {
    /// Per-player input for one frame
    type Input: Copy;
    /// Event raised by the engine during a step
    type Event;

    /// Advance the engine's own state by one frame
    fn step(&mut self, frame: i32, inputs: &[Self::Input], events: &mut EventQueue<Self::Event>);
}

/// A world plus the scripts that drive it
pub struct Simulation<W: SimulationWorld> {
    store: ScriptStore,
    world: W,
    host: ScriptHost<W>,
    events: EventQueue<W::Event>,
    frame: i32,
    script_failures: u64,
}

impl<W: SimulationWorld> Simulation<W> {
    pub fn new(world: W, host: ScriptHost<W>) -> Self {
        Self {
            store: ScriptStore::new(),
            world,
            host,
            events: EventQueue::new(),
            frame: 0,
            script_failures: 0,
        }
    }

    /// Frame that the next call to [`advance`](Self::advance) simulates
    pub fn frame(&self) -> i32 {
        self.frame
    }

    pub fn store(&self) -> &ScriptStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ScriptStore {
        &mut self.store
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Total script calls that returned an error
    pub fn script_failures(&self) -> u64 {
        self.script_failures
    }

    /// Simulate one frame with the given per-player inputs
    pub fn advance(&mut self, inputs: &[W::Input]) {
        self.world.step(self.frame, inputs, &mut self.events);
        let failures = self.host.run_frame(
            self.frame,
            &mut self.store,
            &mut self.world,
            inputs,
            &mut self.events,
        );
        self.script_failures += failures as u64;
        self.frame += 1;
    }

    /// Capture the current frame into the manager's ring
    pub fn save(&self, manager: &mut RollbackStateManager) -> Result<SnapshotRef, SaveStateError> {
        manager.save_state(self.frame, &self.store, &self.world)
    }

    /// Rewind to a previously saved frame
    ///
    /// On error the store is unchanged, but the engine may already have been
    /// restored; the caller must not keep simulating.
    pub fn rollback_to(
        &mut self,
        manager: &RollbackStateManager,
        frame: i32,
    ) -> Result<RemapStats, LoadStateError> {
        let stats = manager.rollback_to(frame, &mut self.store, &mut self.world)?;
        self.events.clear();
        self.frame = frame;
        Ok(stats)
    }

    /// Tear down into the store and world
    pub fn into_parts(self) -> (ScriptStore, W) {
        (self.store, self.world)
    }
}
