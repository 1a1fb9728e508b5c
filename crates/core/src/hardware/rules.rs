//! Declarative hardware rules.
//!
//! A rule is installed on the driver board and fires on its own when the
//! trigger transition happens; the software later observes the same switch
//! event and reconciles its state.

use serde::Serialize;

use super::types::{Coil, Switch, SwitchEvent};

/// Identifier of an installable rule. At most one rule per id is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// Lock lane entry kicks the gate so the ball drops into the holder.
    LockGate,
    /// Holder reaching the release station cuts the motor.
    PlanetAutoStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "ms", rename_all = "snake_case")]
pub enum RuleAction {
    Pulse(u64),
    Enable,
    Disable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RuleEffect {
    pub coil: Coil,
    pub action: RuleAction,
}

/// Trigger condition plus the coil effects applied by the driver board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HardwareRule {
    pub id: RuleId,
    pub trigger: SwitchEvent,
    pub effects: Vec<RuleEffect>,
}

impl HardwareRule {
    /// Gate rule armed by `enable_lock`.
    pub fn lock_gate(gate_pulse_ms: u64) -> Self {
        Self {
            id: RuleId::LockGate,
            trigger: SwitchEvent::active(Switch::LockLane),
            effects: vec![RuleEffect {
                coil: Coil::LockGate,
                action: RuleAction::Pulse(gate_pulse_ms),
            }],
        }
    }

    /// Auto-stop-on-position rule used by the fast eject strategy.
    pub fn planet_auto_stop() -> Self {
        Self {
            id: RuleId::PlanetAutoStop,
            trigger: SwitchEvent::active(Switch::PlanetPosition),
            effects: vec![RuleEffect {
                coil: Coil::PlanetMotor,
                action: RuleAction::Disable,
            }],
        }
    }

    /// Whether this rule reacts to the given transition.
    pub fn matches(&self, event: &SwitchEvent) -> bool {
        self.trigger == *event
    }
}
