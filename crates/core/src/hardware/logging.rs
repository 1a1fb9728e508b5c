//! Actuators that only trace what would be sent to the driver board.

use tracing::debug;

use super::rules::{HardwareRule, RuleId};
use super::traits::Actuators;
use super::types::Coil;

/// Actuator sink used when no physical driver layer is attached.
#[derive(Debug, Default, Clone)]
pub struct LoggingActuators;

impl LoggingActuators {
    pub fn new() -> Self {
        Self
    }
}

impl Actuators for LoggingActuators {
    fn pulse(&self, coil: Coil, ms: u64) {
        debug!(%coil, ms, "coil pulse");
    }

    fn enable(&self, coil: Coil) {
        debug!(%coil, "coil enable");
    }

    fn disable(&self, coil: Coil) {
        debug!(%coil, "coil disable");
    }

    fn install_rule(&self, rule: HardwareRule) {
        debug!(rule = ?rule.id, trigger = %rule.trigger.switch, "install rule");
    }

    fn remove_rule(&self, id: RuleId) {
        debug!(rule = ?id, "remove rule");
    }
}
