//! Core types for rollback sessions

use ggrs::SyncTestSession;

use super::super::config::{FrameInput, ScriptRollbackConfig};

/// Session type for GGRS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionType {
    /// Local session (no rollback, single machine)
    Local,
    /// Sync test session (local with rollback for testing determinism)
    SyncTest,
}

/// Inner session types for different modes
///
/// The sync-test variant is boxed; its GGRS session is much larger than the
/// local variant.
pub(super) enum SessionInner<I: FrameInput> {
    /// Local session - no GGRS, just direct execution
    Local {
        /// Stored inputs for each player (set via add_local_input)
        stored_inputs: Vec<I>,
    },
    /// Sync test session for determinism testing
    SyncTest {
        session: Box<SyncTestSession<ScriptRollbackConfig<I>>>,
    },
}
