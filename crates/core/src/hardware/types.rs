//! Switch and coil identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Switches this subsystem reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Switch {
    /// Holder position sensor; fires once per rotation at the release station.
    PlanetPosition,
    /// Release arm / ring sensor; opens when a released ball has cleared.
    ReleaseArm,
    /// Ball entered the lock feed lane (drives the gate rule).
    LockLane,
    /// Ball seated inside the holder.
    HolderEntry,
    /// Ball returned to the trough.
    Drain,
    /// Jackpot ramp made.
    JackpotRamp,
    /// Skill shot target bank completed.
    SkillBank,
}

impl Switch {
    pub const ALL: [Switch; 7] = [
        Switch::PlanetPosition,
        Switch::ReleaseArm,
        Switch::LockLane,
        Switch::HolderEntry,
        Switch::Drain,
        Switch::JackpotRamp,
        Switch::SkillBank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Switch::PlanetPosition => "planet_position",
            Switch::ReleaseArm => "release_arm",
            Switch::LockLane => "lock_lane",
            Switch::HolderEntry => "holder_entry",
            Switch::Drain => "drain",
            Switch::JackpotRamp => "jackpot_ramp",
            Switch::SkillBank => "skill_bank",
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unknown switch: {0}")]
pub struct UnknownSwitch(pub String);

impl FromStr for Switch {
    type Err = UnknownSwitch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Switch::ALL
            .into_iter()
            .find(|sw| sw.as_str() == s)
            .ok_or_else(|| UnknownSwitch(s.to_string()))
    }
}

/// Logical switch state after the driver layer's debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchState {
    Active,
    Inactive,
}

/// A single switch transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwitchEvent {
    pub switch: Switch,
    pub state: SwitchState,
}

impl SwitchEvent {
    pub fn active(switch: Switch) -> Self {
        Self {
            switch,
            state: SwitchState::Active,
        }
    }

    pub fn inactive(switch: Switch) -> Self {
        Self {
            switch,
            state: SwitchState::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SwitchState::Active
    }
}

/// Actuators owned exclusively by the ball-lock device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coil {
    PlanetMotor,
    Crane,
    Magnet,
    LockGate,
}

impl fmt::Display for Coil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Coil::PlanetMotor => "planet_motor",
            Coil::Crane => "crane",
            Coil::Magnet => "magnet",
            Coil::LockGate => "lock_gate",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_names_round_trip() {
        for switch in Switch::ALL {
            assert_eq!(switch.as_str().parse::<Switch>().unwrap(), switch);
        }
    }

    #[test]
    fn test_unknown_switch() {
        let err = "flipper_left".parse::<Switch>().unwrap_err();
        assert_eq!(err.to_string(), "unknown switch: flipper_left");
    }

    #[test]
    fn test_switch_event_serialization() {
        let event = SwitchEvent::active(Switch::HolderEntry);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"switch":"holder_entry","state":"active"}"#);
    }
}
