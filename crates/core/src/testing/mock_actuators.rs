//! Mock driver layer for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::hardware::{Actuators, Coil, HardwareRule, RuleId};

/// A recorded actuator command for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorCommand {
    Pulse(Coil, u64),
    Enable(Coil),
    Disable(Coil),
    InstallRule(RuleId),
    RemoveRule(RuleId),
}

/// Mock implementation of the Actuators trait.
///
/// Records every command and tracks which coils are held on and which rules
/// are installed, so tests can assert on the resulting hardware state rather
/// than only on the command stream.
#[derive(Debug, Default)]
pub struct MockActuators {
    commands: Mutex<Vec<ActuatorCommand>>,
    enabled: Mutex<HashMap<Coil, bool>>,
    rules: Mutex<HashMap<RuleId, HardwareRule>>,
}

impl MockActuators {
    /// Create a new mock driver layer.
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    /// Get all recorded commands.
    pub fn commands(&self) -> Vec<ActuatorCommand> {
        self.commands.lock().unwrap().clone()
    }

    /// Clear recorded commands (coil and rule state is kept).
    pub fn clear_commands(&self) {
        self.commands.lock().unwrap().clear();
    }

    /// Number of pulses sent to a coil.
    pub fn pulse_count(&self, coil: Coil) -> usize {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|cmd| matches!(cmd, ActuatorCommand::Pulse(c, _) if *c == coil))
            .count()
    }

    /// Whether a coil is currently held on.
    pub fn is_enabled(&self, coil: Coil) -> bool {
        self.enabled
            .lock()
            .unwrap()
            .get(&coil)
            .copied()
            .unwrap_or(false)
    }

    /// Whether a rule is currently installed.
    pub fn has_rule(&self, id: RuleId) -> bool {
        self.rules.lock().unwrap().contains_key(&id)
    }

    /// Get an installed rule.
    pub fn rule(&self, id: RuleId) -> Option<HardwareRule> {
        self.rules.lock().unwrap().get(&id).cloned()
    }

    fn record(&self, command: ActuatorCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

impl Actuators for MockActuators {
    fn pulse(&self, coil: Coil, ms: u64) {
        self.record(ActuatorCommand::Pulse(coil, ms));
    }

    fn enable(&self, coil: Coil) {
        self.enabled.lock().unwrap().insert(coil, true);
        self.record(ActuatorCommand::Enable(coil));
    }

    fn disable(&self, coil: Coil) {
        self.enabled.lock().unwrap().insert(coil, false);
        self.record(ActuatorCommand::Disable(coil));
    }

    fn install_rule(&self, rule: HardwareRule) {
        let id = rule.id;
        self.rules.lock().unwrap().insert(id, rule);
        self.record(ActuatorCommand::InstallRule(id));
    }

    fn remove_rule(&self, id: RuleId) {
        self.rules.lock().unwrap().remove(&id);
        self.record(ActuatorCommand::RemoveRule(id));
    }
}
