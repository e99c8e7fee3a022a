//! Session construction and initialization

use ggrs::SessionBuilder;

use crate::config::Config;
use crate::simulation::{Simulation, SimulationWorld};

use super::super::config::{FrameInput, ScriptRollbackConfig, SessionConfig};
use super::super::events::SessionError;
use super::super::state::RollbackStateManager;
use super::driver::RollbackDriver;
use super::session::RollbackSession;
use super::types::{SessionInner, SessionType};

impl<W> RollbackSession<W>
where
    W: SimulationWorld,
    W::Input: FrameInput,
{
    /// Create a new local session (no rollback)
    ///
    /// Frames advance immediately with the inputs stored by
    /// [`add_local_input`](Self::add_local_input); nothing is saved.
    pub fn new_local(config: &Config, simulation: Simulation<W>) -> Self {
        let session_config = config.session.clone();
        Self {
            inner: SessionInner::Local {
                stored_inputs: vec![W::Input::default(); session_config.num_players],
            },
            session_type: SessionType::Local,
            config: session_config,
            simulation,
            driver: RollbackDriver::new(RollbackStateManager::new(&config.snapshots)),
            halted: false,
        }
    }

    /// Create a new sync test session (for testing determinism)
    ///
    /// Sync test sessions roll back `check_distance` frames every frame and
    /// compare the resimulated checksums with the first pass.
    ///
    /// Checksums cover raw token bytes, so an engine whose restores hand out
    /// new tokens (a non-identity [`RemapTable`](crate::RemapTable)) fails the
    /// check even when it replays correctly. Validate such engines with
    /// [`Simulation::rollback_to`] instead.
    pub fn new_sync_test(config: &Config, simulation: Simulation<W>) -> Result<Self, SessionError> {
        let session_config: SessionConfig = config.session.clone();
        let session = SessionBuilder::<ScriptRollbackConfig<W::Input>>::new()
            .with_num_players(session_config.num_players)
            .with_max_prediction_window(session_config.max_prediction_frames)
            .with_input_delay(session_config.input_delay)
            .with_check_distance(session_config.check_distance)
            .start_synctest_session()?;

        tracing::info!(
            "Starting sync test session: {} players, check distance {}",
            session_config.num_players,
            session_config.check_distance
        );

        Ok(Self {
            inner: SessionInner::SyncTest {
                session: Box::new(session),
            },
            session_type: SessionType::SyncTest,
            config: session_config,
            simulation,
            driver: RollbackDriver::new(RollbackStateManager::new(&config.snapshots)),
            halted: false,
        })
    }
}
