//! Ball-lock device implementation.
//!
//! Per-release sequence:
//! `Idle -> Seeking|Aligning -> MagnetEngaged -> Releasing -> Settling -> {Idle | next}`
//!
//! A release is confirmed only once the magnet-release timer has elapsed and
//! the release arm has reported the ball clear, in either order.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::hardware::{Actuators, Coil, HardwareRule, RuleId, Switch, SwitchEvent};
use crate::metrics::{
    BALLS_RELEASED, BALL_SEARCHES, COUNT_CLAMPS, EJECT_REQUESTS, EJECT_SEQUENCES, LOCKS_TOTAL,
    STRAY_SENSOR_TRIGGERS,
};
use crate::timers::{DeviceTimer, TimerKey, TimerQueue};

use super::config::{DeviceConfig, EjectStrategy};
use super::types::{DeviceEvent, DeviceStatus, EjectPhase, RecoveryOutcome, RotationPhase};

/// The rotating holder with its crane, magnet and lock gate.
pub struct PlanetDevice {
    config: DeviceConfig,
    actuators: Arc<dyn Actuators>,
    /// Upper bound for `locked_count` (the machine's ball complement).
    max_locked: u32,

    locked_count: u32,
    pending_eject: u32,
    lock_enabled: bool,

    eject: EjectPhase,
    rotation: RotationPhase,
    position_active: bool,
    /// The slot at the release station was emptied by the last release and
    /// the holder has not turned since.
    slot_emptied: bool,

    // Release confirmation needs both of these.
    magnet_released: bool,
    arm_cleared: bool,

    /// Current release was started by `recover` on an empty holder.
    search_cycle: bool,
    auto_stop_installed: bool,
}

impl PlanetDevice {
    /// Create a new device with an empty holder and everything de-energized.
    pub fn new(config: DeviceConfig, total_balls: u32, actuators: Arc<dyn Actuators>) -> Self {
        Self {
            config,
            actuators,
            max_locked: total_balls,
            locked_count: 0,
            pending_eject: 0,
            lock_enabled: false,
            eject: EjectPhase::Idle,
            rotation: RotationPhase::Stopped,
            position_active: false,
            slot_emptied: false,
            magnet_released: false,
            arm_cleared: false,
            search_cycle: false,
            auto_stop_installed: false,
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn locked_count(&self) -> u32 {
        self.locked_count
    }

    pub fn pending_eject(&self) -> u32 {
        self.pending_eject
    }

    /// Balls held that are not committed to leave.
    pub fn retained(&self) -> u32 {
        self.locked_count - self.pending_eject
    }

    pub fn lock_enabled(&self) -> bool {
        self.lock_enabled
    }

    pub fn eject_in_progress(&self) -> bool {
        self.eject != EjectPhase::Idle
    }

    pub fn eject_phase(&self) -> EjectPhase {
        self.eject
    }

    pub fn rotation_phase(&self) -> RotationPhase {
        self.rotation
    }

    pub fn status(&self) -> DeviceStatus {
        DeviceStatus {
            locked_count: self.locked_count,
            pending_eject: self.pending_eject,
            eject_in_progress: self.eject_in_progress(),
            lock_enabled: self.lock_enabled,
            eject_phase: self.eject,
            rotation_phase: self.rotation,
            position_active: self.position_active,
            strategy: self.config.strategy,
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Arm the lock gate. The gate reacts to the lock lane on the driver
    /// board; the holder starts turning if it was idle.
    pub fn enable_lock(&mut self) {
        if self.lock_enabled {
            return;
        }
        self.lock_enabled = true;
        self.actuators
            .install_rule(HardwareRule::lock_gate(self.config.gate_pulse_ms));
        info!(locked = self.locked_count, "Lock gate armed");
        self.update_rotation();
    }

    /// Disarm the lock gate.
    pub fn disable_lock(&mut self) {
        if !self.lock_enabled {
            return;
        }
        self.lock_enabled = false;
        self.actuators.remove_rule(RuleId::LockGate);
        info!(locked = self.locked_count, "Lock gate disarmed");
        self.update_rotation();
    }

    /// Queue `count` balls for release. Returns how many were accepted:
    /// requests beyond the balls actually retained are clamped so that
    /// `pending_eject` never exceeds `locked_count`.
    ///
    /// A call while a sequence is running only extends the queue.
    pub fn request_eject(&mut self, count: u32, timers: &mut TimerQueue) -> u32 {
        let accepted = count.min(self.retained());
        if accepted < count {
            warn!(
                requested = count,
                accepted,
                locked = self.locked_count,
                pending = self.pending_eject,
                "Eject request exceeds retained balls, clamping"
            );
            COUNT_CLAMPS.with_label_values(&["pending_eject"]).inc();
        }
        if accepted == 0 {
            return 0;
        }

        self.pending_eject += accepted;
        EJECT_REQUESTS.inc_by(accepted as u64);
        info!(
            accepted,
            pending = self.pending_eject,
            locked = self.locked_count,
            in_progress = self.eject_in_progress(),
            "Eject requested"
        );

        if self.eject == EjectPhase::Idle {
            self.start_sequence(timers);
        } else if self.config.strategy == EjectStrategy::Fast
            && self.eject == EjectPhase::Settling
            && self.rotation != RotationPhase::Seeking
            && !self.parked_at_release()
        {
            debug!("Pre-positioning for queued release");
            self.start_alignment();
        }
        accepted
    }

    /// Entry point for the external ball-search service.
    pub fn perform_ball_search(&mut self, timers: &mut TimerQueue) -> RecoveryOutcome {
        self.recover(timers)
    }

    /// Idempotent recovery. Safe to call at any time:
    /// - a sequence waiting on the holder or the release arm gets its current
    ///   actuator command re-issued
    /// - an idle, empty holder runs one count-neutral release cycle in case a
    ///   ball is stuck inside it
    /// - otherwise nothing is stuck and the call is a no-op
    pub fn recover(&mut self, timers: &mut TimerQueue) -> RecoveryOutcome {
        let outcome = match self.eject {
            EjectPhase::Idle if self.locked_count == 0 => {
                info!("Ball search: cycling empty holder");
                self.search_cycle = true;
                self.start_sequence(timers);
                RecoveryOutcome::SearchCycle
            }
            EjectPhase::Idle => RecoveryOutcome::Noop,
            EjectPhase::Seeking => {
                warn!("Ball search: holder never reached release station, re-driving motor");
                self.actuators.enable(Coil::PlanetMotor);
                RecoveryOutcome::Kick
            }
            EjectPhase::Aligning => {
                warn!("Ball search: alignment stalled, re-arming auto-stop");
                self.actuators.install_rule(HardwareRule::planet_auto_stop());
                self.auto_stop_installed = true;
                self.actuators.enable(Coil::PlanetMotor);
                RecoveryOutcome::Kick
            }
            EjectPhase::Releasing if self.magnet_released && !self.arm_cleared => {
                warn!("Ball search: release arm never cleared, re-firing crane");
                self.actuators.pulse(Coil::Crane, self.config.crane_pulse_ms);
                RecoveryOutcome::Kick
            }
            EjectPhase::MagnetEngaged | EjectPhase::Releasing | EjectPhase::Settling => {
                RecoveryOutcome::Noop
            }
        };
        BALL_SEARCHES.with_label_values(&[outcome.as_str()]).inc();
        outcome
    }

    // =========================================================================
    // Inbound events
    // =========================================================================

    /// React to a switch transition. Switches the device does not own are
    /// ignored.
    pub fn handle_switch(
        &mut self,
        event: SwitchEvent,
        timers: &mut TimerQueue,
    ) -> Vec<DeviceEvent> {
        let mut events = Vec::new();
        match event.switch {
            Switch::PlanetPosition => {
                self.position_active = event.is_active();
                if event.is_active() {
                    self.on_position(timers);
                }
            }
            Switch::ReleaseArm if event.is_active() => self.on_arm_open(timers, &mut events),
            Switch::HolderEntry if event.is_active() => self.on_ball_entered(&mut events),
            _ => {}
        }
        events
    }

    /// React to one of the device's own timers.
    pub fn handle_timer(&mut self, timer: DeviceTimer, timers: &mut TimerQueue) -> Vec<DeviceEvent> {
        let mut events = Vec::new();
        match (timer, self.eject) {
            (DeviceTimer::MagnetHold, EjectPhase::MagnetEngaged) => {
                self.actuators.disable(Coil::Magnet);
                self.actuators.pulse(Coil::Crane, self.config.crane_pulse_ms);
                self.eject = EjectPhase::Releasing;
                self.magnet_released = false;
                self.arm_cleared = false;
                timers.schedule(
                    TimerKey::Device(DeviceTimer::MagnetRelease),
                    self.config.magnet_release_ms,
                );
                debug!("Magnet released, crane fired");
            }
            (DeviceTimer::MagnetRelease, EjectPhase::Releasing) => {
                self.magnet_released = true;
                self.try_confirm_release(timers, &mut events);
            }
            (DeviceTimer::Settle, EjectPhase::Settling) => {
                self.finish_settle(timers, &mut events);
            }
            (timer, phase) => {
                debug!(?timer, ?phase, "Ignoring timer outside its phase");
            }
        }
        events
    }

    // =========================================================================
    // Sequence internals
    // =========================================================================

    fn start_sequence(&mut self, timers: &mut TimerQueue) {
        EJECT_SEQUENCES
            .with_label_values(&[self.config.strategy.as_str()])
            .inc();
        info!(
            strategy = self.config.strategy.as_str(),
            pending = self.pending_eject,
            search = self.search_cycle,
            "Eject sequence started"
        );
        self.begin_release(timers);
    }

    /// Get the holder to the release station for the next ball.
    fn begin_release(&mut self, timers: &mut TimerQueue) {
        self.magnet_released = false;
        self.arm_cleared = false;

        match self.config.strategy {
            EjectStrategy::Conservative => {
                self.eject = EjectPhase::Seeking;
                self.rotation = RotationPhase::Seeking;
                self.slot_emptied = false;
                self.actuators.enable(Coil::PlanetMotor);
            }
            EjectStrategy::Fast => {
                if self.parked_at_release() {
                    debug!("Holder already at release station, skipping alignment");
                    self.teardown_auto_stop();
                    self.rotation = RotationPhase::AtRelease;
                    self.engage_magnet(timers);
                } else {
                    self.eject = EjectPhase::Aligning;
                    if !(self.rotation == RotationPhase::Seeking && self.auto_stop_installed) {
                        self.start_alignment();
                    }
                }
            }
        }
    }

    /// Whether the holder is stopped at the release station with a slot
    /// that has not been released there yet.
    fn parked_at_release(&self) -> bool {
        if self.slot_emptied {
            return false;
        }
        match self.rotation {
            RotationPhase::AtRelease => true,
            RotationPhase::Stopped => self.position_active,
            RotationPhase::Spinning | RotationPhase::Seeking => false,
        }
    }

    /// Drive toward the release station with the auto-stop rule installed.
    fn start_alignment(&mut self) {
        if !self.auto_stop_installed {
            self.actuators.install_rule(HardwareRule::planet_auto_stop());
            self.auto_stop_installed = true;
        }
        self.rotation = RotationPhase::Seeking;
        self.slot_emptied = false;
        self.actuators.enable(Coil::PlanetMotor);
    }

    fn teardown_auto_stop(&mut self) {
        if self.auto_stop_installed {
            self.actuators.remove_rule(RuleId::PlanetAutoStop);
            self.auto_stop_installed = false;
        }
    }

    fn engage_magnet(&mut self, timers: &mut TimerQueue) {
        self.eject = EjectPhase::MagnetEngaged;
        self.actuators.enable(Coil::Magnet);
        timers.schedule(
            TimerKey::Device(DeviceTimer::MagnetHold),
            self.config.hold_ms(),
        );
        debug!(hold_ms = self.config.hold_ms(), "Magnet engaged");
    }

    /// Position sensor went active. Only meaningful while seeking.
    fn on_position(&mut self, timers: &mut TimerQueue) {
        if self.rotation != RotationPhase::Seeking {
            debug!(phase = ?self.eject, rotation = ?self.rotation, "Ignoring position sensor while not seeking");
            STRAY_SENSOR_TRIGGERS
                .with_label_values(&[Switch::PlanetPosition.as_str()])
                .inc();
            return;
        }

        match self.eject {
            EjectPhase::Seeking => {
                self.actuators.disable(Coil::PlanetMotor);
                self.rotation = RotationPhase::AtRelease;
                self.engage_magnet(timers);
            }
            EjectPhase::Aligning => {
                // Motor already cut by the auto-stop rule.
                self.teardown_auto_stop();
                self.rotation = RotationPhase::AtRelease;
                self.engage_magnet(timers);
            }
            EjectPhase::Settling => {
                // Pre-positioned for the next release; wait out the settle window.
                self.teardown_auto_stop();
                self.rotation = RotationPhase::AtRelease;
                debug!("Holder pre-positioned during settle");
            }
            _ => {
                debug!(phase = ?self.eject, "Ignoring position sensor outside seek");
                STRAY_SENSOR_TRIGGERS
                    .with_label_values(&[Switch::PlanetPosition.as_str()])
                    .inc();
            }
        }
    }

    fn on_arm_open(&mut self, timers: &mut TimerQueue, events: &mut Vec<DeviceEvent>) {
        match self.eject {
            EjectPhase::Releasing => {
                if self.arm_cleared {
                    debug!("Duplicate release arm trigger");
                    return;
                }
                self.arm_cleared = true;
                self.try_confirm_release(timers, events);
            }
            phase => {
                debug!(?phase, "Ignoring release arm outside release window");
                STRAY_SENSOR_TRIGGERS
                    .with_label_values(&[Switch::ReleaseArm.as_str()])
                    .inc();
            }
        }
    }

    fn on_ball_entered(&mut self, events: &mut Vec<DeviceEvent>) {
        if self.locked_count >= self.max_locked {
            warn!(
                locked = self.locked_count,
                "Holder entry with every ball already locked, treating as duplicate"
            );
            COUNT_CLAMPS.with_label_values(&["locked_count"]).inc();
            return;
        }

        let armed = self.lock_enabled;
        self.locked_count += 1;
        LOCKS_TOTAL
            .with_label_values(&[if armed { "armed" } else { "sneaky" }])
            .inc();
        info!(armed, locked = self.locked_count, "Ball locked in holder");
        events.push(DeviceEvent::BallLocked {
            armed,
            locked: self.locked_count,
        });

        if self.eject == EjectPhase::Idle {
            self.update_rotation();
        }
    }

    fn try_confirm_release(&mut self, timers: &mut TimerQueue, events: &mut Vec<DeviceEvent>) {
        if !(self.magnet_released && self.arm_cleared) {
            return;
        }

        let counted = !self.search_cycle || self.pending_eject > 0;
        if counted {
            self.locked_count = clamped_decrement(self.locked_count, "locked_count");
            self.pending_eject = clamped_decrement(self.pending_eject, "pending_eject");
        }
        self.search_cycle = false;
        self.slot_emptied = true;
        BALLS_RELEASED.inc();
        info!(
            counted,
            locked = self.locked_count,
            pending = self.pending_eject,
            "Release confirmed"
        );
        events.push(DeviceEvent::BallReleased {
            locked: self.locked_count,
            pending_eject: self.pending_eject,
            counted,
        });

        self.eject = EjectPhase::Settling;
        timers.schedule(
            TimerKey::Device(DeviceTimer::Settle),
            self.config.settle_window_ms(),
        );

        if self.config.strategy == EjectStrategy::Fast && self.pending_eject > 0 {
            debug!("Pre-positioning for next release");
            self.start_alignment();
        }
    }

    fn finish_settle(&mut self, timers: &mut TimerQueue, events: &mut Vec<DeviceEvent>) {
        if self.pending_eject > 0 {
            self.begin_release(timers);
            return;
        }

        self.eject = EjectPhase::Idle;
        self.teardown_auto_stop();
        info!(locked = self.locked_count, "Eject sequence finished");
        events.push(DeviceEvent::SequenceFinished);
        self.update_rotation();
    }

    /// Keep the holder turning while it holds balls or the lock is armed.
    /// Only applies between sequences; a sequence drives the motor itself.
    fn update_rotation(&mut self) {
        if self.eject != EjectPhase::Idle {
            return;
        }
        let want_spin = self.locked_count > 0 || self.pending_eject > 0 || self.lock_enabled;
        match (want_spin, self.rotation) {
            (true, RotationPhase::Spinning) | (false, RotationPhase::Stopped) => {}
            (true, _) => {
                self.actuators.enable(Coil::PlanetMotor);
                self.rotation = RotationPhase::Spinning;
                self.slot_emptied = false;
            }
            (false, RotationPhase::AtRelease) => {
                // Parked with the motor already off.
                self.rotation = RotationPhase::Stopped;
            }
            (false, _) => {
                self.actuators.disable(Coil::PlanetMotor);
                self.rotation = RotationPhase::Stopped;
            }
        }
    }
}

fn clamped_decrement(value: u32, counter: &'static str) -> u32 {
    if value == 0 {
        warn!(counter, "Release with counter already at zero, clamping");
        COUNT_CLAMPS.with_label_values(&[counter]).inc();
        return 0;
    }
    value - 1
}
