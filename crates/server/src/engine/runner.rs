//! Engine task implementation.
//!
//! One task owns the [`Machine`]. Commands, timer ticks and ball-search polls
//! are all handled here in sequence, so the machine never needs a lock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use orrery_core::{
    audit::AuditHandle, config::EngineConfig, hardware::Actuators, player::PlayerStore, Config,
    Machine, NotificationCallback,
};

use crate::metrics::ENGINE_COMMANDS_TOTAL;

use super::handle::EngineHandle;
use super::launcher::SimulatedLauncher;
use super::search::BallSearchSchedule;
use super::types::EngineCommand;

/// Queue depth for engine commands.
const COMMAND_BUFFER_SIZE: usize = 256;

/// Collaborators handed to the engine at spawn time.
pub struct EngineDeps {
    pub actuators: Arc<dyn Actuators>,
    pub players: Arc<dyn PlayerStore>,
    pub audit: Option<AuditHandle>,
    pub notify: Option<NotificationCallback>,
}

/// The engine task state.
pub struct Engine {
    machine: Machine,
    config: EngineConfig,
    search: BallSearchSchedule,
    rx: mpsc::Receiver<EngineCommand>,
    shutdown_rx: broadcast::Receiver<()>,
}

/// Build the machine and start the engine task.
pub fn spawn_engine(config: &Config, deps: EngineDeps) -> (EngineHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let launcher = Arc::new(SimulatedLauncher::new(&tx, config.engine.launch_delay_ms));
    let mut machine = Machine::new(config, deps.actuators, launcher, deps.players);
    if let Some(audit) = deps.audit {
        machine = machine.with_audit(audit);
    }
    if let Some(notify) = deps.notify {
        machine = machine.with_notification_callback(notify);
    }

    let engine = Engine {
        machine,
        config: config.engine.clone(),
        search: BallSearchSchedule::new(config.engine.ball_search.clone()),
        rx,
        shutdown_rx,
    };
    let task = tokio::spawn(engine.run());
    (EngineHandle::new(tx, shutdown_tx), task)
}

impl Engine {
    /// Process commands and ticks until shut down or every handle is dropped.
    pub async fn run(mut self) {
        info!(tick_ms = self.config.tick_ms, "Engine started");

        let mut ticker = tokio::time::interval(Duration::from_millis(self.config.tick_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("Engine received shutdown signal");
                    break;
                }
                command = self.rx.recv() => {
                    match command {
                        Some(command) => self.handle_command(command),
                        None => {
                            debug!("All engine handles dropped");
                            break;
                        }
                    }
                }
                _ = ticker.tick() => {
                    let elapsed = last_tick.elapsed().as_millis() as u64;
                    if elapsed > 0 {
                        last_tick += Duration::from_millis(elapsed);
                        self.machine.advance(elapsed);
                    }
                    self.poll_ball_search();
                }
            }
        }

        info!(now_ms = self.machine.now(), "Engine stopped");
    }

    fn handle_command(&mut self, command: EngineCommand) {
        ENGINE_COMMANDS_TOTAL
            .with_label_values(&[command.name()])
            .inc();

        // Failed sends below only mean the caller stopped waiting.
        match command {
            EngineCommand::Switch(event) => {
                self.search.record_activity(self.machine.now());
                self.machine.handle_switch(event);
            }
            EngineCommand::LaunchCompleted => self.machine.launch_completed(),
            EngineCommand::StartGame(reply) => {
                let _ = reply.send(self.machine.start_game());
            }
            EngineCommand::EndGame(reply) => {
                let _ = reply.send(self.machine.end_game());
            }
            EngineCommand::AddPlayer(reply) => {
                let _ = reply.send(self.machine.add_player());
            }
            EngineCommand::StartTurn { player, reply } => {
                self.search.record_activity(self.machine.now());
                let _ = reply.send(self.machine.start_turn(player));
            }
            EngineCommand::EndTurn(reply) => {
                let _ = reply.send(self.machine.end_turn());
            }
            EngineCommand::QualifyLocks(reply) => {
                let _ = reply.send(self.machine.qualify_locks());
            }
            EngineCommand::Eject { count, reply } => {
                let _ = reply.send(self.machine.request_eject(count));
            }
            EngineCommand::Launch {
                count,
                stealth,
                reply,
            } => {
                let _ = reply.send(self.machine.launch_balls(count, stealth));
            }
            EngineCommand::BallSearch(reply) => {
                let _ = reply.send(self.machine.perform_ball_search());
            }
            EngineCommand::Snapshot(reply) => {
                let _ = reply.send(self.machine.snapshot());
            }
        }
    }

    fn poll_ball_search(&mut self) {
        if self
            .search
            .poll(self.machine.now(), self.machine.balls_requested())
        {
            let outcome = self.machine.perform_ball_search();
            info!(outcome = outcome.as_str(), "Ball search");
        }
    }
}
