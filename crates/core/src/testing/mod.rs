//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits the
//! core consumes (driver layer, feed launcher), allowing full lock/eject
//! scenarios to be scripted without hardware.
//!
//! # Example
//!
//! ```rust,ignore
//! use orrery_core::testing::{fixtures, MockActuators, MockLauncher};
//!
//! let actuators = MockActuators::new();
//! let launcher = MockLauncher::new();
//! let mut machine = fixtures::machine(&actuators, &launcher);
//!
//! machine.start_game()?;
//! assert_eq!(launcher.launched_balls(), 1);
//! ```

mod mock_actuators;
mod mock_launcher;

pub use mock_actuators::{ActuatorCommand, MockActuators};
pub use mock_launcher::MockLauncher;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use crate::config::Config;
    use crate::device::{EjectStrategy, RotationPhase};
    use crate::hardware::{Switch, SwitchEvent};
    use crate::machine::Machine;
    use crate::player::MemoryPlayerStore;

    use super::{MockActuators, MockLauncher};

    /// Default configuration: 5 balls, 3-ball holder, conservative ejects.
    pub fn machine_config() -> Config {
        Config::default()
    }

    /// Default configuration with the fast eject strategy.
    pub fn fast_machine_config() -> Config {
        let mut config = Config::default();
        config.device.strategy = EjectStrategy::Fast;
        config
    }

    /// Build a machine wired to the given mocks.
    pub fn machine(actuators: &Arc<MockActuators>, launcher: &Arc<MockLauncher>) -> Machine {
        machine_with_config(machine_config(), actuators, launcher)
    }

    pub fn machine_with_config(
        config: Config,
        actuators: &Arc<MockActuators>,
        launcher: &Arc<MockLauncher>,
    ) -> Machine {
        Machine::new(
            &config,
            Arc::clone(actuators) as Arc<dyn crate::hardware::Actuators>,
            Arc::clone(launcher) as Arc<dyn crate::ledger::FeedLauncher>,
            Arc::new(MemoryPlayerStore::new()),
        )
    }

    /// Press and release a switch.
    pub fn hit(machine: &mut Machine, switch: Switch) {
        machine.handle_switch(SwitchEvent::active(switch));
        machine.handle_switch(SwitchEvent::inactive(switch));
    }

    /// Drive one full physical release: holder reaches the release station,
    /// magnet holds, crane fires, the arm reports the ball clear and the
    /// settle window passes.
    pub fn release_one(machine: &mut Machine) {
        let hold = machine.config().device.hold_ms();
        let release = machine.config().device.magnet_release_ms;
        let settle = machine.config().device.settle_window_ms();

        if machine.device().rotation_phase() != RotationPhase::AtRelease {
            machine.handle_switch(SwitchEvent::inactive(Switch::PlanetPosition));
            machine.handle_switch(SwitchEvent::active(Switch::PlanetPosition));
        }
        machine.advance(hold);
        machine.advance(release);
        hit(machine, Switch::ReleaseArm);
        machine.advance(settle);
    }

    /// Capture a ball in the holder through the lock lane.
    pub fn lock_ball(machine: &mut Machine) {
        hit(machine, Switch::LockLane);
        hit(machine, Switch::HolderEntry);
    }
}
