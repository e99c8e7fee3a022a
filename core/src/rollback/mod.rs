//! GGRS rollback integration
//!
//! # Architecture
//!
//! - `ScriptRollbackConfig<I>`: GGRS configuration parameterized by the frame input type
//! - `FrameSnapshot`: encoded script store and engine state with a checksum for desync detection
//! - `SnapshotRing`: the last N snapshots, indexed by `frame mod capacity`
//! - `RollbackStateManager`: save, load and rollback against the ring
//! - `RollbackSession<W>`: session manager for local and sync-test modes
//!
//! # Rollback Flow
//!
//! 1. GGRS asks for frame `f` to be saved; the store and engine are encoded into slot `f mod N`
//! 2. On misprediction GGRS asks for frame `f` to be loaded
//! 3. The store is decoded, the engine restores itself and reports a `RemapTable`
//! 4. Stored entity tokens are translated through the table and the store is swapped in
//! 5. GGRS replays the frames since `f` with corrected inputs

mod config;
mod engine;
mod events;
mod session;
mod state;

pub use config::{
    DEFAULT_CHECK_DISTANCE, DEFAULT_INPUT_DELAY, DEFAULT_SNAPSHOT_CAPACITY, FrameInput,
    MAX_INPUT_DELAY, MAX_ROLLBACK_FRAMES, MAX_STATE_SIZE, ScriptRollbackConfig, SessionConfig,
};
pub use engine::RollbackEngine;
pub use events::{SessionError, SessionEvent};
pub use session::{RollbackDriver, RollbackSession, SessionType};
pub use state::{
    FrameSnapshot, LoadStateError, RollbackStateManager, SaveStateError, SnapshotRef,
    SnapshotRing, StatePool,
};
