//! RollbackSession core implementation

use ggrs::{GgrsRequest, InputStatus};

use crate::simulation::{Simulation, SimulationWorld};

use super::super::config::{FrameInput, ScriptRollbackConfig, SessionConfig};
use super::super::events::{SessionError, SessionEvent};
use super::driver::RollbackDriver;
use super::types::{SessionInner, SessionType};

/// Rollback session manager
///
/// Owns the simulation and feeds it through GGRS. Local sessions advance
/// directly; sync-test sessions roll back every frame and compare
/// checksums to catch nondeterminism in the engine or the scripts.
///
/// Any error halts the session: the simulation may be partially restored
/// and further calls to [`advance_frame`](Self::advance_frame) are refused.
pub struct RollbackSession<W>
where
    W: SimulationWorld,
    W::Input: FrameInput,
{
    pub(super) inner: SessionInner<W::Input>,
    pub(super) session_type: SessionType,
    pub(super) config: SessionConfig,
    pub(super) simulation: Simulation<W>,
    pub(super) driver: RollbackDriver,
    pub(super) halted: bool,
}

impl<W> RollbackSession<W>
where
    W: SimulationWorld,
    W::Input: FrameInput,
{
    /// Get the session type
    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    /// Get the session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn simulation(&self) -> &Simulation<W> {
        &self.simulation
    }

    pub fn driver(&self) -> &RollbackDriver {
        &self.driver
    }

    /// Get current frame number
    pub fn current_frame(&self) -> i32 {
        self.simulation.frame()
    }

    /// Check if an error has stopped the session
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Add local input for a player
    ///
    /// For Local sessions, input is stored immediately.
    /// For GGRS sessions, input is passed to GGRS for synchronization.
    pub fn add_local_input(&mut self, player_handle: usize, input: W::Input) -> Result<(), SessionError> {
        match &mut self.inner {
            SessionInner::Local { stored_inputs } => {
                if let Some(slot) = stored_inputs.get_mut(player_handle) {
                    *slot = input;
                }
                Ok(())
            }
            SessionInner::SyncTest { session } => {
                session.add_local_input(player_handle, input)?;
                Ok(())
            }
        }
    }

    /// Advance one frame, handling every request GGRS issues for it
    pub fn advance_frame(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        if self.halted {
            return Err(SessionError::Halted);
        }
        let result = self.advance_frame_inner();
        if let Err(e) = &result {
            tracing::error!("Session halted at frame {}: {}", self.simulation.frame(), e);
            self.halted = true;
        }
        result
    }

    fn advance_frame_inner(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        let requests: Vec<GgrsRequest<ScriptRollbackConfig<W::Input>>> = match &mut self.inner {
            SessionInner::Local { stored_inputs } => {
                let inputs = stored_inputs
                    .iter()
                    .map(|input| (*input, InputStatus::Confirmed))
                    .collect();
                vec![GgrsRequest::AdvanceFrame { inputs }]
            }
            SessionInner::SyncTest { session } => session.advance_frame()?,
        };
        self.driver.handle_requests(&mut self.simulation, requests)
    }

    /// End the session, returning the simulation
    pub fn into_simulation(self) -> Simulation<W> {
        self.simulation
    }
}
