//! Rollback state management
//!
//! Snapshots pair the encoded script store with the engine's own state blob,
//! kept in a ring indexed by frame and backed by a buffer pool.

mod manager;
mod pool;
mod ring;
mod snapshot;

pub use manager::{LoadStateError, RollbackStateManager, SaveStateError};
pub use pool::StatePool;
pub use ring::SnapshotRing;
pub use snapshot::{FrameSnapshot, SnapshotRef};
