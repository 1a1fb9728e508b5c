//! Ball ledger implementation.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::device::PlanetDevice;
use crate::metrics::COUNT_CLAMPS;
use crate::timers::TimerQueue;

use super::traits::FeedLauncher;
use super::types::{LaunchPlan, LaunchRequest, LedgerSnapshot};

/// Owner of every ball counter. All mutations go through its methods so the
/// partition over `total_balls` can be checked in one place.
pub struct BallLedger {
    total_balls: u32,
    launcher: Arc<dyn FeedLauncher>,

    trough: u32,
    /// One entry per ball handed to the launcher, `true` for stealth.
    feed_queue: VecDeque<bool>,
    in_play: u32,
    /// Stealth balls that left the feed and have not been captured yet.
    stealth_in_play: u32,
    /// Mirrors `PlanetDevice::locked_count`.
    locked: u32,
    /// Mirrors `PlanetDevice::pending_eject`.
    pending_eject: u32,
}

impl BallLedger {
    /// Create a ledger with every ball resting in the trough.
    pub fn new(total_balls: u32, launcher: Arc<dyn FeedLauncher>) -> Self {
        Self {
            total_balls,
            launcher,
            trough: total_balls,
            feed_queue: VecDeque::new(),
            in_play: 0,
            stealth_in_play: 0,
            locked: 0,
            pending_eject: 0,
        }
    }

    pub fn total_balls(&self) -> u32 {
        self.total_balls
    }

    pub fn balls_in_trough(&self) -> u32 {
        self.trough
    }

    pub fn balls_in_play(&self) -> u32 {
        self.in_play
    }

    pub fn balls_stealth_in_play(&self) -> u32 {
        self.stealth_in_play
    }

    pub fn balls_locked(&self) -> u32 {
        self.locked
    }

    pub fn balls_pending_eject(&self) -> u32 {
        self.pending_eject
    }

    /// Balls handed to the feed launcher that have not left the feed yet.
    pub fn balls_pending_feed(&self) -> u32 {
        self.feed_queue.len() as u32
    }

    /// Balls committed to play but not physically there yet: pending feed
    /// launches plus balls pending eject from the holder.
    pub fn balls_pending_launch(&self) -> u32 {
        self.balls_pending_feed() + self.pending_eject
    }

    pub fn balls_pending_stealth_launch(&self) -> u32 {
        self.feed_queue.iter().filter(|stealth| **stealth).count() as u32
    }

    /// How many balls the game currently believes are in play.
    ///
    /// Locked balls are excluded; balls queued to launch are included because
    /// the game has already committed to them.
    pub fn balls_requested(&self) -> u32 {
        self.in_play + self.balls_pending_launch() - self.balls_pending_stealth_launch()
    }

    /// Whether the partition over `total_balls` holds.
    pub fn check_invariant(&self) -> bool {
        let located = self.trough
            + self.balls_pending_feed()
            + self.in_play
            + self.stealth_in_play
            + self.locked;
        located == self.total_balls && self.pending_eject <= self.locked
    }

    /// Whether the mirrored counters agree with the device.
    pub fn matches_device(&self, device: &PlanetDevice) -> bool {
        self.locked == device.locked_count() && self.pending_eject == device.pending_eject()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            total_balls: self.total_balls,
            balls_in_trough: self.trough,
            balls_in_play: self.in_play,
            balls_stealth_in_play: self.stealth_in_play,
            balls_locked: self.locked,
            balls_pending_eject: self.pending_eject,
            balls_pending_feed: self.balls_pending_feed(),
            balls_pending_launch: self.balls_pending_launch(),
            balls_pending_stealth_launch: self.balls_pending_stealth_launch(),
            balls_requested: self.balls_requested(),
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Put `count` more balls into play.
    ///
    /// The feed lane can only supply what is in the trough; any shortfall is
    /// requested from the holder first. Both requests are issued here, from a
    /// single reading of the counts.
    pub fn launch_balls(
        &mut self,
        count: u32,
        stealth: bool,
        device: &mut PlanetDevice,
        timers: &mut TimerQueue,
    ) -> LaunchPlan {
        if count == 0 {
            return LaunchPlan::default();
        }

        let shortfall = count.saturating_sub(self.trough);
        // Stealth balls are headed for the holder; never source them from it.
        let ejected = if shortfall > 0 && !stealth {
            self.eject(shortfall, device, timers)
        } else {
            0
        };
        let fed = (count - ejected).min(self.trough);
        let plan = LaunchPlan {
            ejected,
            fed,
            unfilled: count - ejected - fed,
        };

        if fed > 0 {
            self.trough -= fed;
            self.feed_queue.extend(std::iter::repeat(stealth).take(fed as usize));
            self.launcher.launch(LaunchRequest { count: fed, stealth });
        }
        if plan.unfilled > 0 {
            warn!(
                requested = count,
                ejected,
                fed,
                "Not enough balls to satisfy launch request, clamping"
            );
            COUNT_CLAMPS.with_label_values(&["launch"]).inc();
        }

        info!(
            count,
            stealth,
            ejected,
            fed,
            requested = self.balls_requested(),
            "Launch planned"
        );
        plan
    }

    /// Ask the device to release up to `count` retained balls, keeping the
    /// mirrored counters in step. Returns the accepted count.
    pub fn eject(&mut self, count: u32, device: &mut PlanetDevice, timers: &mut TimerQueue) -> u32 {
        let accepted = device.request_eject(count, timers);
        self.pending_eject = (self.pending_eject + accepted).min(self.locked);
        accepted
    }

    // =========================================================================
    // Physical completions
    // =========================================================================

    /// The feed launcher reports one ball has left the feed lane. Returns
    /// whether that ball was a stealth launch, or `None` if nothing was
    /// pending.
    pub fn launch_completed(&mut self) -> Option<bool> {
        let Some(stealth) = self.feed_queue.pop_front() else {
            warn!("Launch completion with no launch pending, ignoring");
            COUNT_CLAMPS.with_label_values(&["pending_feed"]).inc();
            return None;
        };
        if stealth {
            self.stealth_in_play += 1;
        } else {
            self.in_play += 1;
        }
        debug!(stealth, in_play = self.in_play, "Launch completed");
        Some(stealth)
    }

    /// A ball seated in the holder. A stealth ball on its way in is the most
    /// likely source, then a ball in play.
    pub fn record_lock(&mut self) -> bool {
        if self.stealth_in_play > 0 {
            self.stealth_in_play -= 1;
        } else if self.in_play > 0 {
            self.in_play -= 1;
        } else if self.trough > 0 {
            warn!("Capture with no ball in play, taking it from the trough count");
            COUNT_CLAMPS.with_label_values(&["in_play"]).inc();
            self.trough -= 1;
        } else {
            warn!(locked = self.locked, "Capture with no ball anywhere to take it from, ignoring");
            COUNT_CLAMPS.with_label_values(&["locked"]).inc();
            return false;
        }
        self.locked += 1;
        true
    }

    /// The device confirmed a release. Uncounted releases (search cycles on
    /// an empty holder) move nothing.
    pub fn record_release(&mut self, counted: bool) {
        if !counted {
            return;
        }
        if self.locked == 0 {
            warn!("Release with no ball locked, clamping");
            COUNT_CLAMPS.with_label_values(&["locked"]).inc();
            return;
        }
        self.locked -= 1;
        if self.pending_eject == 0 {
            warn!("Release with no eject pending, clamping");
            COUNT_CLAMPS.with_label_values(&["pending_eject"]).inc();
        } else {
            self.pending_eject -= 1;
        }
        self.in_play += 1;
    }

    /// A ball returned to the trough. Returns whether a ball in play was
    /// accounted for it.
    pub fn ball_drained(&mut self) -> bool {
        if self.in_play > 0 {
            self.in_play -= 1;
        } else if self.stealth_in_play > 0 {
            self.stealth_in_play -= 1;
        } else {
            warn!("Drain with no ball in play, ignoring");
            COUNT_CLAMPS.with_label_values(&["in_play"]).inc();
            return false;
        }
        self.trough += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceConfig;
    use crate::hardware::{Actuators, Switch, SwitchEvent};
    use crate::testing::{MockActuators, MockLauncher};

    struct Rig {
        ledger: BallLedger,
        device: PlanetDevice,
        timers: TimerQueue,
        launcher: Arc<MockLauncher>,
    }

    fn rig() -> Rig {
        let launcher = MockLauncher::new();
        let actuators = MockActuators::new();
        Rig {
            ledger: BallLedger::new(5, Arc::clone(&launcher) as Arc<dyn FeedLauncher>),
            device: PlanetDevice::new(
                DeviceConfig::default(),
                5,
                actuators as Arc<dyn Actuators>,
            ),
            timers: TimerQueue::new(),
            launcher,
        }
    }

    impl Rig {
        fn launch(&mut self, count: u32, stealth: bool) -> LaunchPlan {
            self.ledger
                .launch_balls(count, stealth, &mut self.device, &mut self.timers)
        }

        fn capture(&mut self) {
            self.device
                .handle_switch(SwitchEvent::active(Switch::HolderEntry), &mut self.timers);
            self.ledger.record_lock();
        }
    }

    #[test]
    fn test_new_ledger_holds_everything_in_trough() {
        let rig = rig();
        assert_eq!(rig.ledger.balls_in_trough(), 5);
        assert_eq!(rig.ledger.balls_requested(), 0);
        assert!(rig.ledger.check_invariant());
    }

    #[test]
    fn test_launch_counts_immediately() {
        let mut rig = rig();
        let plan = rig.launch(1, false);

        assert_eq!(plan, LaunchPlan { ejected: 0, fed: 1, unfilled: 0 });
        assert_eq!(rig.ledger.balls_requested(), 1);
        assert_eq!(rig.ledger.balls_in_play(), 0);
        assert_eq!(
            rig.launcher.requests(),
            vec![LaunchRequest { count: 1, stealth: false }]
        );

        rig.ledger.launch_completed();
        assert_eq!(rig.ledger.balls_requested(), 1);
        assert_eq!(rig.ledger.balls_in_play(), 1);
        assert!(rig.ledger.check_invariant());
    }

    #[test]
    fn test_stealth_launch_does_not_change_requested() {
        let mut rig = rig();
        rig.launch(1, false);
        rig.ledger.launch_completed();

        rig.launch(1, true);
        assert_eq!(rig.ledger.balls_pending_stealth_launch(), 1);
        assert_eq!(rig.ledger.balls_requested(), 1);

        assert_eq!(rig.ledger.launch_completed(), Some(true));
        assert_eq!(rig.ledger.balls_requested(), 1);

        // The stealth ball is the one the holder captures.
        rig.capture();
        assert_eq!(rig.ledger.balls_in_play(), 1);
        assert_eq!(rig.ledger.balls_stealth_in_play(), 0);
        assert_eq!(rig.ledger.balls_locked(), 1);
        assert!(rig.ledger.check_invariant());
    }

    #[test]
    fn test_shortfall_is_ejected_first() {
        let mut rig = rig();
        rig.launch(3, false);
        for _ in 0..3 {
            rig.ledger.launch_completed();
        }
        rig.capture();
        rig.capture();
        assert_eq!(rig.ledger.balls_in_trough(), 2);

        let plan = rig.launch(3, false);
        assert_eq!(plan, LaunchPlan { ejected: 1, fed: 2, unfilled: 0 });
        assert_eq!(rig.device.pending_eject(), 1);
        assert!(rig.ledger.matches_device(&rig.device));
        assert_eq!(rig.ledger.balls_requested(), 4);
        assert!(rig.ledger.check_invariant());
    }

    #[test]
    fn test_launch_beyond_complement_is_clamped() {
        let mut rig = rig();
        let plan = rig.launch(7, false);
        assert_eq!(plan, LaunchPlan { ejected: 0, fed: 5, unfilled: 2 });
        assert_eq!(rig.ledger.balls_requested(), 5);
        assert!(rig.ledger.check_invariant());
    }

    #[test]
    fn test_release_moves_ball_into_play() {
        let mut rig = rig();
        rig.launch(1, false);
        rig.ledger.launch_completed();
        rig.capture();
        assert_eq!(rig.ledger.balls_requested(), 0);

        let accepted = rig.ledger.eject(1, &mut rig.device, &mut rig.timers);
        assert_eq!(accepted, 1);
        assert_eq!(rig.ledger.balls_requested(), 1);

        rig.ledger.record_release(true);
        assert_eq!(rig.ledger.balls_requested(), 1);
        assert_eq!(rig.ledger.balls_in_play(), 1);
        assert_eq!(rig.ledger.balls_locked(), 0);
        assert!(rig.ledger.check_invariant());
    }

    #[test]
    fn test_uncounted_release_moves_nothing() {
        let mut rig = rig();
        rig.ledger.record_release(false);
        assert_eq!(rig.ledger.snapshot().balls_in_play, 0);
        assert!(rig.ledger.check_invariant());
    }

    #[test]
    fn test_duplicate_signals_are_clamped() {
        let mut rig = rig();
        assert_eq!(rig.ledger.launch_completed(), None);
        assert!(!rig.ledger.ball_drained());
        rig.ledger.record_release(true);
        assert_eq!(rig.ledger.balls_locked(), 0);
        assert_eq!(rig.ledger.balls_in_trough(), 5);
        assert!(rig.ledger.check_invariant());
    }

    #[test]
    fn test_drain_returns_ball_to_trough() {
        let mut rig = rig();
        rig.launch(2, false);
        rig.ledger.launch_completed();
        rig.ledger.launch_completed();

        assert!(rig.ledger.ball_drained());
        assert_eq!(rig.ledger.balls_requested(), 1);
        assert_eq!(rig.ledger.balls_in_trough(), 4);
        assert!(rig.ledger.check_invariant());
    }
}
