//! Lock, multiball and jackpot rules.

use tracing::{debug, info, warn};

use crate::audit::AuditEvent;
use crate::metrics::{JACKPOTS_COLLECTED, LOCKS_TOTAL, MULTIBALLS_STARTED};

use super::config::MultiballConfig;
use super::context::RulesContext;
use super::types::{
    JackpotState, LockOwnership, MultiballPhase, MultiballStatus, Notification, VirtualLockDeficit,
};

/// Rule layer driving the device for the player whose turn is active.
///
/// Reacts to captures reported by the device and to playfield shots, and
/// queues [`Notification`]s for the host to deliver.
pub struct MultiballCoordinator {
    config: MultiballConfig,

    player: Option<usize>,
    ownership: LockOwnership,
    /// Balls in the holder beyond this player's credit. Collected by lane
    /// shots without a capture once the holder is full.
    virtual_credits: u32,
    /// Shots still owed before the gate re-arms, after the player's credit
    /// was capped at turn start.
    lock_paydown: u32,
    phase: MultiballPhase,
    jackpot: JackpotState,
    multiballs_completed: u32,

    outbox: Vec<Notification>,
}

impl MultiballCoordinator {
    pub fn new(config: MultiballConfig) -> Self {
        let jackpot = JackpotState::new(&config);
        Self {
            config,
            player: None,
            ownership: LockOwnership::default(),
            virtual_credits: 0,
            lock_paydown: 0,
            phase: MultiballPhase::Load,
            jackpot,
            multiballs_completed: 0,
            outbox: Vec::new(),
        }
    }

    pub fn player(&self) -> Option<usize> {
        self.player
    }

    pub fn phase(&self) -> MultiballPhase {
        self.phase
    }

    pub fn ownership(&self) -> &LockOwnership {
        &self.ownership
    }

    pub fn jackpot(&self) -> &JackpotState {
        &self.jackpot
    }

    pub fn virtual_credits(&self) -> u32 {
        self.virtual_credits
    }

    pub fn lock_paydown(&self) -> u32 {
        self.lock_paydown
    }

    pub fn status(&self) -> MultiballStatus {
        MultiballStatus {
            player: self.player,
            phase: self.phase,
            ownership: self.ownership,
            jackpot: self.jackpot,
            virtual_credits: self.virtual_credits,
            lock_paydown: self.lock_paydown,
            multiballs_completed: self.multiballs_completed,
        }
    }

    /// Drain queued notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    // =========================================================================
    // Turn lifecycle
    // =========================================================================

    /// Begin `player`'s turn with their stored record, reconciling it against
    /// what the device physically holds.
    ///
    /// Balls held beyond the player's credit leave the gate armed for a fast
    /// re-lock. Credit beyond what is held is capped, and the lost locks must
    /// be paid down with shots before the gate re-arms.
    pub fn start_turn(
        &mut self,
        player: usize,
        mut ownership: LockOwnership,
        ctx: &mut RulesContext<'_>,
    ) -> VirtualLockDeficit {
        let deficit = VirtualLockDeficit::compute(ctx.device.retained(), ownership.balls_locked);
        if deficit.is_capped() {
            warn!(
                player,
                credited = deficit.credited,
                physical = deficit.physical,
                "Player credited with more locks than the holder contains, capping credit"
            );
            ownership.balls_locked = deficit.capped_credit();
        }

        self.player = Some(player);
        self.ownership = ownership;
        self.virtual_credits = deficit.reconciled();
        self.lock_paydown = deficit.lost_credit();
        self.phase = MultiballPhase::Load;
        self.jackpot = JackpotState::new(&self.config);
        self.multiballs_completed = 0;

        info!(
            player,
            balls_locked = self.ownership.balls_locked,
            locks_lit = self.ownership.locks_lit,
            raw_deficit = deficit.raw(),
            virtual_credits = self.virtual_credits,
            lock_paydown = self.lock_paydown,
            "Turn started"
        );
        self.refresh_gate(ctx);
        deficit
    }

    /// End the active turn. Returns the record to persist for that player.
    pub fn end_turn(&mut self, ctx: &mut RulesContext<'_>) -> Option<(usize, LockOwnership)> {
        let player = self.player.take()?;
        self.phase = MultiballPhase::Load;
        self.virtual_credits = 0;
        self.lock_paydown = 0;
        self.jackpot.lit = false;
        self.refresh_gate(ctx);
        info!(
            player,
            balls_locked = self.ownership.balls_locked,
            locks_lit = self.ownership.locks_lit,
            "Turn ended"
        );
        Some((player, self.ownership))
    }

    // =========================================================================
    // Playfield events
    // =========================================================================

    /// The lock qualifier was completed. The first time in a game every lock
    /// lights at once; afterwards one at a time. Returns whether anything
    /// was lit.
    pub fn qualify_locks(&mut self, ctx: &mut RulesContext<'_>) -> bool {
        let Some(player) = self.player else {
            return false;
        };
        if self.phase == MultiballPhase::Multiball {
            debug!("Lock qualifier ignored during multiball");
            return false;
        }

        let target = if self.ownership.multiball_played {
            (self.ownership.locks_lit + 1).min(self.config.locks_for_multiball)
        } else {
            self.config.locks_for_multiball
        };
        if target <= self.ownership.locks_lit {
            return false;
        }

        self.ownership.locks_lit = target;
        info!(player, locks_lit = target, "Locks lit");
        self.outbox.push(Notification::LocksLit {
            player,
            locks_lit: target,
        });
        self.refresh_gate(ctx);
        true
    }

    /// A ball went up the lock lane. An armed gate diverts it into the
    /// holder and the capture is credited there. With the gate disarmed the
    /// shot pays down owed locks, or collects a lit lock virtually when the
    /// full holder already contains balls this player has no credit for.
    pub fn lock_lane_hit(&mut self, ctx: &mut RulesContext<'_>) {
        let Some(player) = self.player else {
            return;
        };
        if self.phase != MultiballPhase::Load || ctx.device.lock_enabled() {
            return;
        }
        if self.lock_paydown > 0 {
            self.pay_down(player, ctx);
            return;
        }
        if self.virtual_credits == 0 || !self.ownership.lock_available() {
            return;
        }

        self.virtual_credits -= 1;
        self.ownership.balls_locked += 1;
        LOCKS_TOTAL.with_label_values(&["virtual"]).inc();
        info!(
            player,
            balls_locked = self.ownership.balls_locked,
            virtual_credits = self.virtual_credits,
            "Virtual lock collected"
        );
        self.outbox.push(Notification::LockCollected {
            player,
            balls_locked: self.ownership.balls_locked,
            virtual_lock: true,
        });
        self.credit_award(player);

        if self.ownership.balls_locked >= self.config.locks_for_multiball {
            self.start_multiball(player, ctx);
        } else {
            self.refresh_gate(ctx);
        }
    }

    /// The device captured a ball.
    pub fn ball_locked(&mut self, armed: bool, ctx: &mut RulesContext<'_>) {
        let Some(player) = self.player else {
            warn!("Ball captured with no turn in progress, ejecting");
            ctx.eject(1, "unowned_lock");
            return;
        };

        if !armed || self.phase == MultiballPhase::Multiball {
            self.sneaky_lock(player, ctx);
            return;
        }

        self.ownership.balls_locked += 1;
        info!(
            player,
            balls_locked = self.ownership.balls_locked,
            locks_lit = self.ownership.locks_lit,
            "Lock collected"
        );
        self.outbox.push(Notification::LockCollected {
            player,
            balls_locked: self.ownership.balls_locked,
            virtual_lock: false,
        });
        self.credit_award(player);

        if self.ownership.balls_locked >= self.config.locks_for_multiball {
            self.start_multiball(player, ctx);
            return;
        }

        // Anything the holder contains beyond this player's credit stays
        // put as virtual credit instead of being ejected again.
        self.virtual_credits = ctx.device.retained().saturating_sub(self.ownership.balls_locked);
        self.refresh_gate(ctx);

        if ctx.ledger.balls_requested() == 0 {
            ctx.launch(1, false);
        }
    }

    /// A ramp shot. Counts toward the jackpot during multiball and pays
    /// down owed locks outside it.
    pub fn jackpot_shot(&mut self, ctx: &mut RulesContext<'_>) {
        let Some(player) = self.player else {
            return;
        };
        if self.phase != MultiballPhase::Multiball {
            if self.lock_paydown > 0 {
                self.pay_down(player, ctx);
            }
            return;
        }

        if self.jackpot.lit {
            let value = self.config.jackpot_value(self.multiballs_completed);
            self.jackpot.lit = false;
            self.jackpot.collected += 1;
            self.jackpot.shots_made = 0;
            self.jackpot.shots_required += self.config.jackpot_relight_step;
            JACKPOTS_COLLECTED.inc();
            info!(
                player,
                value,
                collected = self.jackpot.collected,
                next_required = self.jackpot.shots_required,
                "Jackpot collected"
            );
            self.outbox.push(Notification::JackpotCollected {
                player,
                value,
                collected: self.jackpot.collected,
            });
            return;
        }

        self.jackpot.shots_made += 1;
        if self.jackpot.shots_made >= self.jackpot.shots_required {
            self.jackpot.lit = true;
            self.jackpot.shots_made = 0;
            debug!(player, "Jackpot relit");
            self.outbox.push(Notification::JackpotLit {
                player,
                shots_required: self.jackpot.shots_required,
            });
        }
    }

    /// End multiball once the game is down to a single ball.
    pub fn check_multiball_end(&mut self, ctx: &mut RulesContext<'_>) {
        let Some(player) = self.player else {
            return;
        };
        if self.phase != MultiballPhase::Multiball || ctx.ledger.balls_requested() > 1 {
            return;
        }

        self.phase = MultiballPhase::Load;
        self.multiballs_completed += 1;
        self.jackpot.lit = false;
        self.jackpot.shots_made = 0;
        info!(
            player,
            jackpots = self.jackpot.collected,
            completed = self.multiballs_completed,
            "Multiball ended"
        );
        self.outbox.push(Notification::MultiballEnded {
            player,
            jackpots: self.jackpot.collected,
        });
        ctx.emit(AuditEvent::MultiballEnded {
            player,
            jackpots: self.jackpot.collected,
        });
        self.refresh_gate(ctx);
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn pay_down(&mut self, player: usize, ctx: &mut RulesContext<'_>) {
        self.lock_paydown -= 1;
        info!(player, remaining = self.lock_paydown, "Lock deficit paid down");
        self.outbox.push(Notification::LockPaydown {
            player,
            remaining: self.lock_paydown,
        });
        if self.lock_paydown == 0 {
            self.refresh_gate(ctx);
        }
    }

    fn sneaky_lock(&mut self, player: usize, ctx: &mut RulesContext<'_>) {
        self.credit_award(player);
        info!(
            player,
            award_progress = self.ownership.award_progress,
            "Sneaky lock, ejecting captured ball"
        );
        self.outbox.push(Notification::SneakyLock {
            player,
            award_progress: self.ownership.award_progress,
        });
        ctx.eject(1, "sneaky_lock");
    }

    fn start_multiball(&mut self, player: usize, ctx: &mut RulesContext<'_>) {
        ctx.device.disable_lock();
        let retained = ctx.device.retained();
        ctx.eject(retained, "multiball");

        let extra = self
            .config
            .multiball_balls
            .saturating_sub(ctx.ledger.balls_requested());
        if extra > 0 {
            ctx.launch(extra, false);
        }

        self.phase = MultiballPhase::Multiball;
        self.ownership.multiball_played = true;
        self.ownership.balls_locked = 0;
        self.ownership.locks_lit = 0;
        self.virtual_credits = 0;
        self.lock_paydown = 0;
        self.jackpot.lit = true;
        self.jackpot.shots_made = 0;

        let balls = ctx.ledger.balls_requested();
        MULTIBALLS_STARTED.inc();
        info!(player, balls, released = retained, "Multiball started");
        self.outbox.push(Notification::MultiballStarted { player, balls });
        self.outbox.push(Notification::JackpotLit {
            player,
            shots_required: self.jackpot.shots_required,
        });
        ctx.emit(AuditEvent::MultiballStarted { player, balls });
    }

    fn credit_award(&mut self, player: usize) {
        self.ownership.award_progress += 1;
        if self.ownership.award_progress >= self.config.award_threshold {
            self.ownership.award_progress = 0;
            info!(player, "Lock award earned");
            self.outbox.push(Notification::AwardEarned { player });
        }
    }

    /// Arm the gate when a lit lock is waiting, nothing is owed and the
    /// holder has room for another ball.
    fn refresh_gate(&mut self, ctx: &mut RulesContext<'_>) {
        let want_armed = self.player.is_some()
            && self.phase == MultiballPhase::Load
            && self.lock_paydown == 0
            && self.ownership.lock_available()
            && ctx.device.locked_count() < ctx.device.config().capacity;

        if want_armed {
            ctx.device.enable_lock();
        } else {
            ctx.device.disable_lock();
        }
    }
}
