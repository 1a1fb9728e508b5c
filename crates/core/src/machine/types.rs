//! Types for the machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::DeviceStatus;
use crate::ledger::LedgerSnapshot;
use crate::multiball::MultiballStatus;

/// Misuse of the game-control surface. Mechanical and counting problems are
/// never errors; they are clamped and logged where they happen.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("no game in progress")]
    NoGameInProgress,

    #[error("a game is already in progress")]
    GameInProgress,

    #[error("unknown player: {0}")]
    UnknownPlayer(usize),

    #[error("a turn is already in progress")]
    TurnInProgress,

    #[error("no turn in progress")]
    NoActiveTurn,

    #[error("player limit reached ({0})")]
    PlayerLimit(usize),
}

/// Game progress.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatus {
    pub in_progress: bool,
    pub player_count: usize,
    pub active_player: Option<usize>,
}

/// Everything observable about the machine at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub now_ms: u64,
    pub game: GameStatus,
    pub device: DeviceStatus,
    pub ledger: LedgerSnapshot,
    pub multiball: MultiballStatus,
    /// Whether every ball is accounted for exactly once.
    pub accounts_balanced: bool,
}
