//! GGRS request handling

use ggrs::GgrsRequest;

use crate::simulation::{Simulation, SimulationWorld};

use super::super::config::{FrameInput, ScriptRollbackConfig};
use super::super::events::{SessionError, SessionEvent};
use super::super::state::RollbackStateManager;

/// Executes GGRS requests against a [`Simulation`]
///
/// Owns the snapshot ring. GGRS only ever sees a
/// [`SnapshotRef`](crate::rollback::SnapshotRef) per frame.
pub struct RollbackDriver {
    state_manager: RollbackStateManager,
    /// Number of rollbacks performed
    rollbacks: u64,
    /// Number of frames re-simulated after rollbacks
    total_rollback_frames: u64,
}

impl RollbackDriver {
    pub fn new(state_manager: RollbackStateManager) -> Self {
        Self {
            state_manager,
            rollbacks: 0,
            total_rollback_frames: 0,
        }
    }

    pub fn state_manager(&self) -> &RollbackStateManager {
        &self.state_manager
    }

    /// Get mutable access to the state manager
    pub fn state_manager_mut(&mut self) -> &mut RollbackStateManager {
        &mut self.state_manager
    }

    pub fn rollbacks(&self) -> u64 {
        self.rollbacks
    }

    /// Get total rollback frames this session
    pub fn total_rollback_frames(&self) -> u64 {
        self.total_rollback_frames
    }

    /// Handle all GGRS requests for a frame, in order
    ///
    /// Stops at the first failing request. The simulation may then be
    /// partially restored and must not be advanced again.
    pub fn handle_requests<W>(
        &mut self,
        simulation: &mut Simulation<W>,
        requests: Vec<GgrsRequest<ScriptRollbackConfig<W::Input>>>,
    ) -> Result<Vec<SessionEvent>, SessionError>
    where
        W: SimulationWorld,
        W::Input: FrameInput,
    {
        let mut events = Vec::new();
        let mut replaying = false;
        let mut resimulated = 0u32;

        for request in requests {
            match request {
                GgrsRequest::SaveGameState { cell, frame } => {
                    if frame != simulation.frame() {
                        return Err(SessionError::FrameMismatch {
                            expected: frame,
                            actual: simulation.frame(),
                        });
                    }
                    let snapshot = simulation.save(&mut self.state_manager)?;
                    cell.save(frame, Some(snapshot), Some(snapshot.checksum as u128));
                }
                GgrsRequest::LoadGameState { frame, .. } => {
                    let from = simulation.frame();
                    let stats = match simulation.rollback_to(&self.state_manager, frame) {
                        Ok(stats) => stats,
                        Err(e) => {
                            tracing::error!("Rollback from frame {} to {} failed: {}", from, frame, e);
                            return Err(e.into());
                        }
                    };
                    tracing::debug!("Rolled back from frame {} to {}", from, frame);
                    replaying = true;
                    self.rollbacks += 1;
                    events.push(SessionEvent::RolledBack {
                        from,
                        to: frame,
                        stats,
                    });
                }
                GgrsRequest::AdvanceFrame { inputs } => {
                    if replaying {
                        resimulated += 1;
                    }
                    let frame = simulation.frame();
                    let failures_before = simulation.script_failures();
                    let inputs: Vec<W::Input> = inputs.into_iter().map(|(input, _)| input).collect();
                    simulation.advance(&inputs);

                    let failures = simulation.script_failures() - failures_before;
                    if failures > 0 {
                        events.push(SessionEvent::ScriptFailures {
                            frame,
                            count: failures,
                        });
                    }
                }
            }
        }

        // The last AdvanceFrame of a batch simulates the new frame, not a replayed one
        let resimulated = resimulated.saturating_sub(1);
        if resimulated > 0 {
            self.total_rollback_frames += resimulated as u64;
            events.push(SessionEvent::Resimulated {
                frames: resimulated,
            });
        }

        Ok(events)
    }
}
