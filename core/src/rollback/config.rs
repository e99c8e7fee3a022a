//! GGRS session configuration
//!
//! Provides configuration types and constants for rollback sessions.

use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};
use ggrs::Config;
use serde::{Deserialize, Serialize};

use super::state::SnapshotRef;

/// Maximum rollback frames (how far GGRS can rewind)
pub const MAX_ROLLBACK_FRAMES: usize = 8;

/// Maximum input delay frames (trade latency for fewer rollbacks)
pub const MAX_INPUT_DELAY: usize = 10;

/// Default input delay for local play
pub const DEFAULT_INPUT_DELAY: usize = 0;

/// Default sync-test check distance
pub const DEFAULT_CHECK_DISTANCE: usize = 2;

/// Default number of snapshot ring slots
///
/// Two more than the rollback window, so the oldest frame GGRS may ask for
/// is still present while the current frame is being saved.
pub const DEFAULT_SNAPSHOT_CAPACITY: usize = MAX_ROLLBACK_FRAMES + 2;

/// Maximum size of a single snapshot (store + engine) in bytes
pub const MAX_STATE_SIZE: usize = 16 * 1024 * 1024;

/// Per-player frame input
///
/// Must be POD for network serialization and usable as a GGRS input.
pub trait FrameInput:
    Clone
    + Copy
    + Default
    + PartialEq
    + Pod
    + Zeroable
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

/// GGRS configuration for script rollback sessions
///
/// GGRS keeps only a [`SnapshotRef`] per frame; the snapshot bytes live in
/// the [`SnapshotRing`](super::SnapshotRing).
pub struct ScriptRollbackConfig<I: FrameInput> {
    _phantom: PhantomData<I>,
}

impl<I: FrameInput> Config for ScriptRollbackConfig<I> {
    type Input = I;
    type State = SnapshotRef;
    type Address = String;
}

/// Settings for creating a GGRS session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of players in the session
    pub num_players: usize,
    /// Local input delay in frames (0 = responsive, higher = fewer rollbacks)
    pub input_delay: usize,
    /// Maximum prediction frames (how far ahead we can simulate without confirmed input)
    pub max_prediction_frames: usize,
    /// Frames between state checks in sync-test sessions
    pub check_distance: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            num_players: 2,
            input_delay: DEFAULT_INPUT_DELAY,
            max_prediction_frames: MAX_ROLLBACK_FRAMES,
            check_distance: DEFAULT_CHECK_DISTANCE,
        }
    }
}

impl SessionConfig {
    /// Create config for sync test (determinism testing)
    pub fn sync_test(num_players: usize) -> Self {
        Self {
            num_players,
            input_delay: 0,
            ..Default::default()
        }
    }
}
