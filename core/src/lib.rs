//! Rollback core - deterministic script state for rollback netcode
//!
//! This crate provides the state layer that lets gameplay scripts keep
//! persistent data in a simulation that is rewound and replayed by GGRS.
//!
//! # Architecture
//!
//! - [`ScriptStore`] - Keyed script, entity and entity-list state
//! - [`EntityCodec`] - Engine handles to stable [`EntityToken`]s and back
//! - [`RemapTable`] - How tokens saved before a rollback map to replayed entities
//! - [`RollbackStateManager`] - Frame snapshots in a fixed-size ring
//! - [`Simulation`] - Engine, store and scripts advanced one frame at a time
//! - [`RollbackSession`] - GGRS integration for local and sync-test sessions

pub mod config;
pub mod entity;
pub mod events;
#[cfg(test)]
mod integration;
pub mod remap;
pub mod rollback;
pub mod script;
pub mod simulation;
pub mod store;
#[cfg(test)]
pub mod test_utils;
pub mod value;

// Re-export core traits and types
pub use config::{Config, ConfigError, SnapshotConfig};
pub use entity::{EntityCodec, EntityRegistry, EntityToken};
pub use events::EventQueue;
pub use remap::{RemapError, RemapStats, RemapTable, UnmappedPolicy};
pub use script::{Script, ScriptContext, ScriptError, ScriptHost, ScriptPhase};
pub use simulation::{Simulation, SimulationWorld};
pub use store::{EntityListSnapshot, ScriptStore, StoreError};
pub use value::ScriptValue;

// Re-export rollback types
pub use rollback::{
    DEFAULT_CHECK_DISTANCE, DEFAULT_INPUT_DELAY, DEFAULT_SNAPSHOT_CAPACITY, FrameInput,
    FrameSnapshot, LoadStateError, MAX_INPUT_DELAY, MAX_ROLLBACK_FRAMES, MAX_STATE_SIZE,
    RollbackDriver, RollbackEngine, RollbackSession, RollbackStateManager, SaveStateError,
    ScriptRollbackConfig, SessionConfig, SessionError, SessionEvent, SessionType, SnapshotRef,
    SnapshotRing, StatePool,
};

// Re-export GGRS types for convenience
pub use ggrs::{GgrsError, GgrsRequest, InputStatus};
