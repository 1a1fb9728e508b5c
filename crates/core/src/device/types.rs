//! Types for the ball-lock device.

use serde::{Deserialize, Serialize};

use super::config::EjectStrategy;

/// Step of the current eject sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EjectPhase {
    #[default]
    Idle,
    /// Conservative: motor driven, software stops it at the release station.
    Seeking,
    /// Fast: motor driven with the auto-stop rule installed.
    Aligning,
    /// Magnet holding the ball at the release station.
    MagnetEngaged,
    /// Magnet released and crane fired; waiting for timer and release arm.
    Releasing,
    /// Release confirmed; mechanism not yet free.
    Settling,
}

/// What the holder motor is doing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPhase {
    #[default]
    Stopped,
    /// Continuous drive while balls are held or the lock is armed.
    Spinning,
    /// Driving toward the release station.
    Seeking,
    /// Parked at the release station.
    AtRelease,
}

/// Count changes reported to the rest of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// A ball seated in the holder. `armed` is false for a sneaky lock.
    BallLocked { armed: bool, locked: u32 },
    /// A release was confirmed. `counted` is false for a search cycle that
    /// was not backed by any tracked ball.
    BallReleased {
        locked: u32,
        pending_eject: u32,
        counted: bool,
    },
    /// The eject sequence ran out of pending balls.
    SequenceFinished,
}

/// Result of a recovery request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOutcome {
    /// Re-issued the actuator command of the step that is waiting.
    Kick,
    /// Ran one count-neutral release cycle on an empty holder.
    SearchCycle,
    /// Nothing is stuck.
    Noop,
}

impl RecoveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryOutcome::Kick => "kick",
            RecoveryOutcome::SearchCycle => "search_cycle",
            RecoveryOutcome::Noop => "noop",
        }
    }
}

/// Snapshot of device state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub locked_count: u32,
    pub pending_eject: u32,
    pub eject_in_progress: bool,
    pub lock_enabled: bool,
    pub eject_phase: EjectPhase,
    pub rotation_phase: RotationPhase,
    pub position_active: bool,
    pub strategy: EjectStrategy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_event_serialization() {
        let event = DeviceEvent::BallLocked {
            armed: false,
            locked: 2,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"ball_locked","armed":false,"locked":2}"#);
    }

    #[test]
    fn test_status_default() {
        let status = DeviceStatus::default();
        assert_eq!(status.eject_phase, EjectPhase::Idle);
        assert_eq!(status.rotation_phase, RotationPhase::Stopped);
        assert!(!status.eject_in_progress);
    }
}
