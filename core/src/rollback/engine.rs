//! Engine-side rollback hooks

use crate::remap::RemapTable;

/// State the external simulation engine contributes to a snapshot
///
/// The engine owns entity creation, so only it can say how entities that
/// existed when a frame was saved correspond to the entities it recreates on
/// restore.
pub trait RollbackEngine {
    /// Serialize the engine's rollback-relevant state into `buffer`
    ///
    /// `buffer` is empty on entry and may carry spare capacity from an earlier
    /// snapshot.
    fn save_state(&self, buffer: &mut Vec<u8>) -> anyhow::Result<()>;

    /// Restore state produced by [`save_state`](Self::save_state)
    ///
    /// Returns how entity tokens valid at save time map to the tokens of the
    /// restored entities. Entities left out of the table are considered gone.
    fn load_state(&mut self, data: &[u8]) -> anyhow::Result<RemapTable>;
}
