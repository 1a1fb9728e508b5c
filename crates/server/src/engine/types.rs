//! Types for the engine task.

use thiserror::Error;
use tokio::sync::oneshot;

use orrery_core::{
    hardware::SwitchEvent, ledger::LaunchPlan, machine::MachineError,
    multiball::VirtualLockDeficit, MachineSnapshot, RecoveryOutcome,
};

/// Errors returned to callers of the engine handle.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine task has exited.
    #[error("engine is not running")]
    Stopped,

    /// The machine rejected the request.
    #[error(transparent)]
    Machine(#[from] MachineError),
}

/// Reply channel for a command.
pub type Reply<T> = oneshot::Sender<T>;

/// Commands processed by the engine task, in arrival order.
#[derive(Debug)]
pub enum EngineCommand {
    /// A debounced switch transition from the driver layer.
    Switch(SwitchEvent),
    /// The feed lane reports one ball has left it.
    LaunchCompleted,
    StartGame(Reply<Result<(), MachineError>>),
    EndGame(Reply<Result<(), MachineError>>),
    AddPlayer(Reply<Result<usize, MachineError>>),
    StartTurn {
        player: usize,
        reply: Reply<Result<VirtualLockDeficit, MachineError>>,
    },
    EndTurn(Reply<Result<(), MachineError>>),
    QualifyLocks(Reply<Result<bool, MachineError>>),
    Eject {
        count: u32,
        reply: Reply<u32>,
    },
    Launch {
        count: u32,
        stealth: bool,
        reply: Reply<LaunchPlan>,
    },
    BallSearch(Reply<RecoveryOutcome>),
    Snapshot(Reply<MachineSnapshot>),
}

impl EngineCommand {
    /// Label used for metrics and logs.
    pub fn name(&self) -> &'static str {
        match self {
            EngineCommand::Switch(_) => "switch",
            EngineCommand::LaunchCompleted => "launch_completed",
            EngineCommand::StartGame(_) => "start_game",
            EngineCommand::EndGame(_) => "end_game",
            EngineCommand::AddPlayer(_) => "add_player",
            EngineCommand::StartTurn { .. } => "start_turn",
            EngineCommand::EndTurn(_) => "end_turn",
            EngineCommand::QualifyLocks(_) => "qualify_locks",
            EngineCommand::Eject { .. } => "eject",
            EngineCommand::Launch { .. } => "launch",
            EngineCommand::BallSearch(_) => "ball_search",
            EngineCommand::Snapshot(_) => "snapshot",
        }
    }
}
