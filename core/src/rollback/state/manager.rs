//! Rollback state manager: snapshot capture and restore

use crate::config::SnapshotConfig;
use crate::remap::{RemapError, RemapStats, UnmappedPolicy};
use crate::rollback::engine::RollbackEngine;
use crate::store::{ScriptStore, StoreError};

use super::pool::StatePool;
use super::ring::SnapshotRing;
use super::snapshot::{FrameSnapshot, SnapshotRef};

/// Initial capacity of pooled snapshot buffers
const POOL_BUFFER_SIZE: usize = 64 * 1024;

/// Saves and restores the script store together with engine state
///
/// Snapshots are kept in a [`SnapshotRing`]; buffers evicted from the ring
/// are recycled through a [`StatePool`].
pub struct RollbackStateManager {
    ring: SnapshotRing,
    pool: StatePool,
    /// Maximum combined snapshot size in bytes
    max_state_size: usize,
    /// How tokens missing from an engine remap table are treated
    unmapped: UnmappedPolicy,
}

impl RollbackStateManager {
    pub fn new(config: &SnapshotConfig) -> Self {
        Self {
            ring: SnapshotRing::new(config.capacity),
            pool: StatePool::for_ring(config.capacity, POOL_BUFFER_SIZE, config.max_state_size),
            max_state_size: config.max_state_size,
            unmapped: config.unmapped_entities,
        }
    }

    /// Create a manager with default settings
    pub fn with_defaults() -> Self {
        Self::new(&SnapshotConfig::default())
    }

    pub fn ring(&self) -> &SnapshotRing {
        &self.ring
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    pub fn unmapped_policy(&self) -> UnmappedPolicy {
        self.unmapped
    }

    /// Change the ring size; every saved snapshot is discarded
    pub fn resize(&mut self, capacity: usize) {
        for snapshot in self.ring.resize(capacity) {
            self.recycle(snapshot);
        }
        self.pool.fit_ring(capacity);
    }

    /// Capture the store and engine state for `frame`
    ///
    /// Overwrites whatever the frame's slot held. The slot is only replaced
    /// once both blobs have been produced, so a failed save leaves the ring
    /// as it was.
    pub fn save_state<E: RollbackEngine>(
        &mut self,
        frame: i32,
        store: &ScriptStore,
        engine: &E,
    ) -> Result<SnapshotRef, SaveStateError> {
        if frame < 0 {
            return Err(SaveStateError::NegativeFrame(frame));
        }

        let mut store_data = self.pool.acquire();
        if let Err(e) = store.serialize_into(&mut store_data) {
            self.pool.release(store_data);
            return Err(SaveStateError::Store(e));
        }

        let mut engine_data = self.pool.acquire();
        if let Err(e) = engine.save_state(&mut engine_data) {
            self.pool.release(store_data);
            self.pool.release(engine_data);
            return Err(SaveStateError::Engine(format!("{e:#}")));
        }

        let size = store_data.len() + engine_data.len();
        if size > self.max_state_size {
            self.pool.release(store_data);
            self.pool.release(engine_data);
            return Err(SaveStateError::StateTooLarge {
                size,
                max: self.max_state_size,
            });
        }

        let snapshot = FrameSnapshot::new(frame, store_data, engine_data);
        let reference = snapshot.reference();
        if let Some(evicted) = self.ring.insert(snapshot) {
            self.recycle(evicted);
        }
        Ok(reference)
    }

    /// Saved snapshot for exactly `frame`
    ///
    /// [`LoadStateError::Missing`] is the normal outcome for frames older
    /// than the ring's capacity.
    pub fn load_state(&self, frame: i32) -> Result<&FrameSnapshot, LoadStateError> {
        self.ring
            .load(frame)
            .ok_or(LoadStateError::Missing { frame })
    }

    /// Roll the store and engine back to `frame`
    ///
    /// The snapshot's store is decoded and remapped into a fresh store which
    /// only replaces `store` once everything has succeeded. The engine is
    /// restored in between (it produces the remap table), so after a remap
    /// failure the engine is at `frame` while the store is not; the caller
    /// must treat any error as a failed rollback and stop simulating.
    pub fn rollback_to<E: RollbackEngine>(
        &self,
        frame: i32,
        store: &mut ScriptStore,
        engine: &mut E,
    ) -> Result<RemapStats, LoadStateError> {
        let snapshot = self.load_state(frame)?;
        if !snapshot.verify() {
            return Err(LoadStateError::Corrupt { frame });
        }

        let restored = ScriptStore::decode(&snapshot.store_data)?;
        let table = engine
            .load_state(&snapshot.engine_data)
            .map_err(|e| LoadStateError::Engine(format!("{e:#}")))?;

        let (remapped, stats) = restored.remapped(&table, self.unmapped)?;
        *store = remapped;

        tracing::debug!(
            "Rolled back to frame {}: {} tokens remapped, {} states dropped, {} list entries dropped",
            frame,
            stats.remapped,
            stats.dropped_states,
            stats.dropped_list_entries
        );
        Ok(stats)
    }

    fn recycle(&mut self, snapshot: FrameSnapshot) {
        self.pool.release(snapshot.store_data);
        self.pool.release(snapshot.engine_data);
    }
}

impl Default for RollbackStateManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Error saving rollback state
#[derive(Debug, thiserror::Error)]
pub enum SaveStateError {
    #[error("cannot save negative frame {0}")]
    NegativeFrame(i32),

    #[error("failed to encode script store: {0}")]
    Store(#[source] StoreError),

    #[error("engine error during save_state: {0}")]
    Engine(String),

    #[error("state too large: {size} bytes (max {max})")]
    StateTooLarge { size: usize, max: usize },
}

/// Error loading rollback state
#[derive(Debug, thiserror::Error)]
pub enum LoadStateError {
    /// The frame was never saved or has fallen out of the ring
    #[error("no snapshot for frame {frame}")]
    Missing { frame: i32 },

    #[error("snapshot for frame {frame} failed its checksum")]
    Corrupt { frame: i32 },

    #[error("failed to restore script store: {0}")]
    Store(#[from] StoreError),

    #[error("engine error during load_state: {0}")]
    Engine(String),

    #[error("failed to remap entities: {0}")]
    Remap(#[from] RemapError),
}

impl LoadStateError {
    /// True for the expected "frame fell out of the window" outcome, false
    /// for integrity failures
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}
