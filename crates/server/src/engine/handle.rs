//! Cloneable handle for talking to the engine task.

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::warn;

use orrery_core::{
    hardware::SwitchEvent, ledger::LaunchPlan, multiball::VirtualLockDeficit, MachineSnapshot,
    RecoveryOutcome,
};

use super::types::{EngineCommand, EngineError, Reply};

/// Handle for sending commands to the engine.
///
/// Every request is queued behind the ones sent before it, so a snapshot
/// taken after a switch event reflects that event.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineCommand>,
    shutdown_tx: broadcast::Sender<()>,
}

impl EngineHandle {
    pub(crate) fn new(tx: mpsc::Sender<EngineCommand>, shutdown_tx: broadcast::Sender<()>) -> Self {
        Self { tx, shutdown_tx }
    }

    /// Deliver a switch transition.
    pub async fn switch(&self, event: SwitchEvent) -> Result<(), EngineError> {
        self.send(EngineCommand::Switch(event)).await
    }

    /// Report a completed feed launch.
    pub async fn launch_completed(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::LaunchCompleted).await
    }

    pub async fn start_game(&self) -> Result<(), EngineError> {
        Ok(self.request(EngineCommand::StartGame).await??)
    }

    pub async fn end_game(&self) -> Result<(), EngineError> {
        Ok(self.request(EngineCommand::EndGame).await??)
    }

    pub async fn add_player(&self) -> Result<usize, EngineError> {
        Ok(self.request(EngineCommand::AddPlayer).await??)
    }

    pub async fn start_turn(&self, player: usize) -> Result<VirtualLockDeficit, EngineError> {
        Ok(self
            .request(|reply| EngineCommand::StartTurn { player, reply })
            .await??)
    }

    pub async fn end_turn(&self) -> Result<(), EngineError> {
        Ok(self.request(EngineCommand::EndTurn).await??)
    }

    pub async fn qualify_locks(&self) -> Result<bool, EngineError> {
        Ok(self.request(EngineCommand::QualifyLocks).await??)
    }

    /// Ask the holder to release `count` balls. Returns the accepted count.
    pub async fn eject(&self, count: u32) -> Result<u32, EngineError> {
        self.request(|reply| EngineCommand::Eject { count, reply })
            .await
    }

    pub async fn launch(&self, count: u32, stealth: bool) -> Result<LaunchPlan, EngineError> {
        self.request(|reply| EngineCommand::Launch {
            count,
            stealth,
            reply,
        })
        .await
    }

    /// Run one ball-search pass now.
    pub async fn ball_search(&self) -> Result<RecoveryOutcome, EngineError> {
        self.request(EngineCommand::BallSearch).await
    }

    pub async fn snapshot(&self) -> Result<MachineSnapshot, EngineError> {
        self.request(EngineCommand::Snapshot).await
    }

    /// Ask the engine task to stop after the command it is processing.
    pub fn shutdown(&self) {
        if self.shutdown_tx.send(()).is_err() {
            warn!("Engine already stopped");
        }
    }

    async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.tx.send(command).await.map_err(|_| EngineError::Stopped)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> EngineCommand,
    ) -> Result<T, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.send(command(reply)).await?;
        rx.await.map_err(|_| EngineError::Stopped)
    }
}
