use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Turn lifecycle
    TurnStarted {
        player: usize,
        balls_locked: u32,
        locks_lit: u32,
        physical_locks: u32,
        /// Raw physical minus credited, before capping.
        virtual_deficit: i64,
    },
    TurnEnded {
        player: usize,
        balls_locked: u32,
        locks_lit: u32,
    },

    // Device
    BallLocked {
        player: Option<usize>,
        armed: bool,
        locked: u32,
    },
    EjectRequested {
        requested: u32,
        accepted: u32,
        pending_eject: u32,
        source: String,
    },
    BallReleased {
        locked: u32,
        pending_eject: u32,
        counted: bool,
    },
    BallSearch {
        outcome: String,
        locked: u32,
        pending_eject: u32,
    },
    /// A request or sensor report was clamped to keep counts consistent.
    CountClamped {
        counter: String,
        requested: u32,
        applied: u32,
    },

    // Multiball rules
    MultiballStarted {
        player: usize,
        balls: u32,
    },
    MultiballEnded {
        player: usize,
        jackpots: u32,
    },
    JackpotCollected {
        player: usize,
        value: u64,
        collected: u32,
    },
}

impl AuditEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            AuditEvent::ServiceStarted { .. } => "service_started",
            AuditEvent::ServiceStopped { .. } => "service_stopped",
            AuditEvent::TurnStarted { .. } => "turn_started",
            AuditEvent::TurnEnded { .. } => "turn_ended",
            AuditEvent::BallLocked { .. } => "ball_locked",
            AuditEvent::EjectRequested { .. } => "eject_requested",
            AuditEvent::BallReleased { .. } => "ball_released",
            AuditEvent::BallSearch { .. } => "ball_search",
            AuditEvent::CountClamped { .. } => "count_clamped",
            AuditEvent::MultiballStarted { .. } => "multiball_started",
            AuditEvent::MultiballEnded { .. } => "multiball_ended",
            AuditEvent::JackpotCollected { .. } => "jackpot_collected",
        }
    }

    /// Extract the player index if this event has one
    pub fn player(&self) -> Option<usize> {
        match self {
            AuditEvent::TurnStarted { player, .. }
            | AuditEvent::TurnEnded { player, .. }
            | AuditEvent::MultiballStarted { player, .. }
            | AuditEvent::MultiballEnded { player, .. }
            | AuditEvent::JackpotCollected { player, .. } => Some(*player),
            AuditEvent::BallLocked { player, .. } => *player,
            _ => None,
        }
    }
}

/// Stored audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub player: Option<usize>,
    pub data: AuditEvent,
}
