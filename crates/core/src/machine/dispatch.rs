//! Machine implementation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::audit::{AuditEvent, AuditHandle};
use crate::config::Config;
use crate::device::{DeviceEvent, PlanetDevice, RecoveryOutcome};
use crate::hardware::{Actuators, Switch, SwitchEvent};
use crate::ledger::{BallLedger, FeedLauncher, LaunchPlan};
use crate::multiball::{
    LockOwnership, MultiballCoordinator, Notification, NotificationCallback, RulesContext,
    VirtualLockDeficit,
};
use crate::player::PlayerStore;
use crate::timers::{TimerKey, TimerQueue};

use super::types::{GameStatus, MachineError, MachineSnapshot};

/// Maximum players in one game.
pub const MAX_PLAYERS: usize = 4;

struct Game {
    player_count: usize,
    active: Option<usize>,
}

/// The ball-lock subsystem wired together.
pub struct Machine {
    config: Config,
    device: PlanetDevice,
    ledger: BallLedger,
    rules: MultiballCoordinator,
    timers: TimerQueue,
    players: Arc<dyn PlayerStore>,
    audit: Option<AuditHandle>,
    notify: Option<NotificationCallback>,
    game: Option<Game>,
}

impl Machine {
    /// Build a machine from validated configuration. Every ball starts in
    /// the trough and the holder is assumed empty.
    pub fn new(
        config: &Config,
        actuators: Arc<dyn Actuators>,
        launcher: Arc<dyn FeedLauncher>,
        players: Arc<dyn PlayerStore>,
    ) -> Self {
        let total_balls = config.machine.total_balls;
        Self {
            config: config.clone(),
            device: PlanetDevice::new(config.device.clone(), total_balls, actuators),
            ledger: BallLedger::new(total_balls, launcher),
            rules: MultiballCoordinator::new(config.multiball.clone()),
            timers: TimerQueue::new(),
            players,
            audit: None,
            notify: None,
            game: None,
        }
    }

    /// Record state changes to the audit pipeline.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Deliver rule notifications to the mode-sequencing layer.
    pub fn with_notification_callback(mut self, callback: NotificationCallback) -> Self {
        self.notify = Some(callback);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn device(&self) -> &PlanetDevice {
        &self.device
    }

    pub fn ledger(&self) -> &BallLedger {
        &self.ledger
    }

    pub fn rules(&self) -> &MultiballCoordinator {
        &self.rules
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.timers.now()
    }

    /// How many balls the game believes are in play.
    pub fn balls_requested(&self) -> u32 {
        self.ledger.balls_requested()
    }

    pub fn game_status(&self) -> GameStatus {
        match &self.game {
            Some(game) => GameStatus {
                in_progress: true,
                player_count: game.player_count,
                active_player: game.active,
            },
            None => GameStatus::default(),
        }
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            now_ms: self.timers.now(),
            game: self.game_status(),
            device: self.device.status(),
            ledger: self.ledger.snapshot(),
            multiball: self.rules.status(),
            accounts_balanced: self.accounts_balanced(),
        }
    }

    // =========================================================================
    // Game control
    // =========================================================================

    /// Start a one-player game and begin player 0's first turn.
    pub fn start_game(&mut self) -> Result<(), MachineError> {
        if self.game.is_some() {
            return Err(MachineError::GameInProgress);
        }
        if let Err(e) = self.players.clear() {
            warn!("Failed to clear player records: {}", e);
        }
        self.game = Some(Game {
            player_count: 1,
            active: None,
        });
        info!("Game started");
        self.start_turn(0).map(|_| ())
    }

    /// End the game, closing any active turn first.
    pub fn end_game(&mut self) -> Result<(), MachineError> {
        let active = match &self.game {
            Some(game) => game.active,
            None => return Err(MachineError::NoGameInProgress),
        };
        if active.is_some() {
            self.end_turn()?;
        }
        self.game = None;
        info!("Game ended");
        Ok(())
    }

    /// Add a player to the game in progress. Returns the new player's index.
    pub fn add_player(&mut self) -> Result<usize, MachineError> {
        let game = self.game.as_mut().ok_or(MachineError::NoGameInProgress)?;
        if game.player_count >= MAX_PLAYERS {
            return Err(MachineError::PlayerLimit(MAX_PLAYERS));
        }
        game.player_count += 1;
        let player = game.player_count - 1;
        info!(player, "Player added");
        Ok(player)
    }

    /// Begin `player`'s turn: restore their lock record, reconcile it with
    /// the holder and put a ball into play.
    pub fn start_turn(&mut self, player: usize) -> Result<VirtualLockDeficit, MachineError> {
        let game = self.game.as_mut().ok_or(MachineError::NoGameInProgress)?;
        if player >= game.player_count {
            return Err(MachineError::UnknownPlayer(player));
        }
        if game.active.is_some() {
            return Err(MachineError::TurnInProgress);
        }
        game.active = Some(player);

        let ownership = match LockOwnership::load(self.players.as_ref(), player) {
            Ok(ownership) => ownership,
            Err(e) => {
                warn!(player, "Failed to load lock record, starting fresh: {}", e);
                LockOwnership::default()
            }
        };

        let deficit = self.with_rules(|rules, ctx| {
            let deficit = rules.start_turn(player, ownership, ctx);
            if ctx.ledger.balls_requested() == 0 {
                ctx.launch(1, false);
            }
            deficit
        });

        let ownership = *self.rules.ownership();
        self.emit(AuditEvent::TurnStarted {
            player,
            balls_locked: ownership.balls_locked,
            locks_lit: ownership.locks_lit,
            physical_locks: deficit.physical,
            virtual_deficit: deficit.raw(),
        });
        self.flush_notifications();
        Ok(deficit)
    }

    /// End the active turn and persist the player's lock record.
    pub fn end_turn(&mut self) -> Result<(), MachineError> {
        let game = self.game.as_mut().ok_or(MachineError::NoGameInProgress)?;
        if game.active.take().is_none() {
            return Err(MachineError::NoActiveTurn);
        }

        if let Some((player, ownership)) = self.with_rules(|rules, ctx| rules.end_turn(ctx)) {
            if let Err(e) = ownership.store(self.players.as_ref(), player) {
                warn!(player, "Failed to store lock record: {}", e);
            }
            self.emit(AuditEvent::TurnEnded {
                player,
                balls_locked: ownership.balls_locked,
                locks_lit: ownership.locks_lit,
            });
        }
        self.flush_notifications();
        Ok(())
    }

    /// Light locks for the active player, as the skill bank does.
    pub fn qualify_locks(&mut self) -> Result<bool, MachineError> {
        self.active_player()?;
        let lit = self.with_rules(|rules, ctx| rules.qualify_locks(ctx));
        self.flush_notifications();
        Ok(lit)
    }

    // =========================================================================
    // Device commands
    // =========================================================================

    /// Release up to `count` retained balls. Returns the accepted count.
    pub fn request_eject(&mut self, count: u32) -> u32 {
        let accepted = self.with_rules(|_, ctx| ctx.eject(count, "request"));
        self.verify_accounts();
        accepted
    }

    /// Put `count` more balls into play (or feed them stealthily toward the
    /// holder).
    pub fn launch_balls(&mut self, count: u32, stealth: bool) -> LaunchPlan {
        let plan = self.with_rules(|_, ctx| ctx.launch(count, stealth));
        self.verify_accounts();
        plan
    }

    /// Recovery entry point for the ball-search service.
    pub fn perform_ball_search(&mut self) -> RecoveryOutcome {
        let outcome = self.device.perform_ball_search(&mut self.timers);
        self.emit(AuditEvent::BallSearch {
            outcome: outcome.as_str().to_string(),
            locked: self.device.locked_count(),
            pending_eject: self.device.pending_eject(),
        });
        outcome
    }

    // =========================================================================
    // Inbound events
    // =========================================================================

    /// Deliver one switch transition.
    pub fn handle_switch(&mut self, event: SwitchEvent) {
        debug!(switch = %event.switch, state = ?event.state, "Switch");
        let device_events = self.device.handle_switch(event, &mut self.timers);
        self.apply_device_events(device_events);

        if event.is_active() {
            match event.switch {
                Switch::LockLane => self.with_rules(|rules, ctx| rules.lock_lane_hit(ctx)),
                Switch::SkillBank => {
                    self.with_rules(|rules, ctx| rules.qualify_locks(ctx));
                }
                Switch::JackpotRamp => self.with_rules(|rules, ctx| rules.jackpot_shot(ctx)),
                Switch::Drain => self.ball_drained(),
                _ => {}
            }
        }

        self.flush_notifications();
        self.verify_accounts();
    }

    /// Advance virtual time, firing every timer that falls due. Handlers may
    /// schedule new timers that still fall inside the window.
    pub fn advance(&mut self, elapsed_ms: u64) {
        let until = self.timers.now().saturating_add(elapsed_ms);
        while let Some((at, key)) = self.timers.pop_due(until) {
            match key {
                TimerKey::Device(timer) => {
                    debug!(at, ?timer, "Timer fired");
                    let events = self.device.handle_timer(timer, &mut self.timers);
                    self.apply_device_events(events);
                }
            }
        }
        self.timers.advance_to(until);
        self.flush_notifications();
        self.verify_accounts();
    }

    /// The feed launcher reports a ball has left the feed lane.
    pub fn launch_completed(&mut self) {
        self.ledger.launch_completed();
        self.verify_accounts();
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn with_rules<R>(
        &mut self,
        f: impl FnOnce(&mut MultiballCoordinator, &mut RulesContext<'_>) -> R,
    ) -> R {
        let mut ctx = RulesContext {
            device: &mut self.device,
            ledger: &mut self.ledger,
            timers: &mut self.timers,
            audit: self.audit.as_ref(),
        };
        f(&mut self.rules, &mut ctx)
    }

    fn apply_device_events(&mut self, events: Vec<DeviceEvent>) {
        for event in events {
            match event {
                DeviceEvent::BallLocked { armed, locked } => {
                    if !self.ledger.record_lock() {
                        warn!(armed, locked, "Capture with no ball to account for, skipping lock rules");
                        self.emit(AuditEvent::CountClamped {
                            counter: "locked".to_string(),
                            requested: 1,
                            applied: 0,
                        });
                        continue;
                    }
                    self.emit(AuditEvent::BallLocked {
                        player: self.rules.player(),
                        armed,
                        locked,
                    });
                    self.with_rules(|rules, ctx| rules.ball_locked(armed, ctx));
                }
                DeviceEvent::BallReleased {
                    locked,
                    pending_eject,
                    counted,
                } => {
                    self.ledger.record_release(counted);
                    self.emit(AuditEvent::BallReleased {
                        locked,
                        pending_eject,
                        counted,
                    });
                }
                DeviceEvent::SequenceFinished => {
                    debug!(locked = self.device.locked_count(), "Eject sequence idle");
                }
            }
        }
    }

    fn ball_drained(&mut self) {
        self.ledger.ball_drained();
        self.with_rules(|rules, ctx| rules.check_multiball_end(ctx));

        if self.ledger.balls_requested() > 0 {
            return;
        }
        if let Some(player) = self.game.as_ref().and_then(|game| game.active) {
            info!(player, "Last ball drained");
            self.notify(&Notification::BallEnded { player });
        }
    }

    fn active_player(&self) -> Result<usize, MachineError> {
        let game = self.game.as_ref().ok_or(MachineError::NoGameInProgress)?;
        game.active.ok_or(MachineError::NoActiveTurn)
    }

    fn flush_notifications(&mut self) {
        for notification in self.rules.take_notifications() {
            if let Notification::JackpotCollected {
                player,
                value,
                collected,
            } = notification
            {
                self.emit(AuditEvent::JackpotCollected {
                    player,
                    value,
                    collected,
                });
            }
            self.notify(&notification);
        }
    }

    fn notify(&self, notification: &Notification) {
        if let Some(callback) = &self.notify {
            callback(notification);
        }
    }

    fn emit(&self, event: AuditEvent) {
        if let Some(audit) = &self.audit {
            audit.try_emit(event);
        }
    }

    fn accounts_balanced(&self) -> bool {
        self.ledger.check_invariant() && self.ledger.matches_device(&self.device)
    }

    fn verify_accounts(&self) {
        if !self.accounts_balanced() {
            warn!(
                ledger = ?self.ledger.snapshot(),
                locked = self.device.locked_count(),
                pending_eject = self.device.pending_eject(),
                "Ball accounts out of balance"
            );
        }
    }
}
