//! Rollback session events and errors

use ggrs::GgrsError;

use crate::remap::RemapStats;

use super::state::{LoadStateError, SaveStateError};

/// What happened while a batch of GGRS requests was handled
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// State was rewound to an earlier frame
    RolledBack {
        /// Frame the simulation was at before the rollback
        from: i32,
        /// Frame that was restored
        to: i32,
        /// How stored entity tokens were translated
        stats: RemapStats,
    },
    /// Frames re-simulated after a rollback
    Resimulated {
        /// Number of frames replayed
        frames: u32,
    },
    /// Scripts returned errors while advancing a frame
    ScriptFailures {
        frame: i32,
        /// Failed script calls during the frame
        count: u64,
    },
}

/// Session errors
///
/// Every variant ends the session: the simulation may be partially restored
/// and must not keep advancing.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to save state: {0}")]
    SaveState(#[from] SaveStateError),

    #[error("failed to load state: {0}")]
    LoadState(#[from] LoadStateError),

    #[error("GGRS error: {0}")]
    Ggrs(#[from] GgrsError),

    /// GGRS asked for a frame other than the one the simulation is at
    #[error("GGRS expected frame {expected}, simulation is at frame {actual}")]
    FrameMismatch { expected: i32, actual: i32 },

    /// An earlier error left the simulation in an unknown state
    #[error("session halted after an earlier failure")]
    Halted,
}
