//! Integration tests for the rollback core
//!
//! Drive the store, scripts and test engine together through snapshot
//! save, rollback and replay, and through GGRS sessions.


#[cfg(test)]
pub(crate) mod test_utils {
    use crate::simulation::Simulation;
    use crate::test_utils::{RestoreMode, TestInput, TestWorld, test_host};

    pub const SEED: u64 = 0x5EED;

    pub fn new_simulation(mode: RestoreMode) -> Simulation<TestWorld> {
        Simulation::new(TestWorld::new(SEED).with_restore_mode(mode), test_host())
    }

    /// Inputs for a frame: player 0 presses spawn every fourth frame
    pub fn inputs_for(frame: i32) -> [TestInput; 2] {
        let buttons = if frame % 4 == 0 { TestInput::SPAWN } else { 0 };
        [TestInput::pressing(buttons), TestInput::default()]
    }

    /// Advance until the simulation reaches `frame`
    pub fn run_until(simulation: &mut Simulation<TestWorld>, frame: i32) {
        while simulation.frame() < frame {
            let inputs = inputs_for(simulation.frame());
            simulation.advance(&inputs);
        }
    }
}
