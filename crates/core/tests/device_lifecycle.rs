//! Ball-lock device lifecycle integration tests.
//!
//! These tests drive the holder through complete release sequences:
//! capture -> eject request -> seek/align -> magnet -> crane -> settle -> idle
//! and check the ball accounting at every step along the way.

use std::sync::Arc;

use orrery_core::{
    device::{DeviceConfig, DeviceEvent, EjectPhase, EjectStrategy, PlanetDevice, RotationPhase},
    hardware::{Actuators, Coil, Switch, SwitchEvent},
    testing::{fixtures, ActuatorCommand, MockActuators, MockLauncher},
    timers::{TimerKey, TimerQueue},
    Machine, RecoveryOutcome,
};

/// Upper bound on driver steps before a sequence is considered stuck.
const MAX_STEPS: usize = 64;

/// Device-only harness for properties that do not involve the ledger.
struct DeviceHarness {
    device: PlanetDevice,
    timers: TimerQueue,
    actuators: Arc<MockActuators>,
    events: Vec<DeviceEvent>,
}

impl DeviceHarness {
    fn new(strategy: EjectStrategy) -> Self {
        let actuators = MockActuators::new();
        let config = DeviceConfig {
            strategy,
            ..Default::default()
        };
        Self {
            device: PlanetDevice::new(config, 5, Arc::clone(&actuators) as Arc<dyn Actuators>),
            timers: TimerQueue::new(),
            actuators,
            events: Vec::new(),
        }
    }

    fn switch(&mut self, event: SwitchEvent) {
        let events = self.device.handle_switch(event, &mut self.timers);
        self.events.extend(events);
    }

    fn capture(&mut self) {
        self.switch(SwitchEvent::active(Switch::HolderEntry));
        self.switch(SwitchEvent::inactive(Switch::HolderEntry));
    }

    fn advance(&mut self, ms: u64) {
        let until = self.timers.now() + ms;
        while let Some((_, TimerKey::Device(timer))) = self.timers.pop_due(until) {
            let events = self.device.handle_timer(timer, &mut self.timers);
            self.events.extend(events);
        }
        self.timers.advance_to(until);
    }

    /// Play the part of the mechanism for one step of the current phase.
    fn step(&mut self) {
        let config = self.device.config().clone();
        match self.device.eject_phase() {
            EjectPhase::Idle => {}
            EjectPhase::Seeking | EjectPhase::Aligning => {
                self.switch(SwitchEvent::inactive(Switch::PlanetPosition));
                self.switch(SwitchEvent::active(Switch::PlanetPosition));
            }
            EjectPhase::MagnetEngaged => self.advance(config.hold_ms()),
            EjectPhase::Releasing => {
                self.switch(SwitchEvent::active(Switch::ReleaseArm));
                self.switch(SwitchEvent::inactive(Switch::ReleaseArm));
                self.advance(config.magnet_release_ms);
            }
            EjectPhase::Settling => self.advance(config.settle_window_ms()),
        }
    }

    fn run_until_idle(&mut self) {
        for _ in 0..MAX_STEPS {
            if !self.device.eject_in_progress() {
                return;
            }
            self.step();
            assert!(self.device.pending_eject() <= self.device.locked_count());
            assert!(self.device.locked_count() <= 5);
        }
        panic!(
            "eject sequence did not finish, stuck in {:?}",
            self.device.eject_phase()
        );
    }

    fn releases(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DeviceEvent::BallReleased { counted: true, .. }))
            .count()
    }

    fn sequences_finished(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, DeviceEvent::SequenceFinished))
            .count()
    }
}

/// Drive the machine's holder until its eject sequence is over, checking the
/// ledger partition after every mechanical step.
fn run_machine_until_idle(machine: &mut Machine) {
    for _ in 0..MAX_STEPS {
        if !machine.device().eject_in_progress() {
            return;
        }
        let device = machine.config().device.clone();
        match machine.device().eject_phase() {
            EjectPhase::Idle => {}
            EjectPhase::Seeking | EjectPhase::Aligning => {
                machine.handle_switch(SwitchEvent::inactive(Switch::PlanetPosition));
                assert_balanced(machine);
                machine.handle_switch(SwitchEvent::active(Switch::PlanetPosition));
            }
            EjectPhase::MagnetEngaged => machine.advance(device.hold_ms()),
            EjectPhase::Releasing => {
                fixtures::hit(machine, Switch::ReleaseArm);
                assert_balanced(machine);
                machine.advance(device.magnet_release_ms);
            }
            EjectPhase::Settling => machine.advance(device.settle_window_ms()),
        }
        assert_balanced(machine);
    }
    panic!(
        "eject sequence did not finish, stuck in {:?}",
        machine.device().eject_phase()
    );
}

fn assert_balanced(machine: &Machine) {
    let ledger = machine.ledger();
    let device = machine.device();
    let sum = ledger.balls_requested()
        + (device.locked_count() - device.pending_eject())
        + ledger.balls_in_trough()
        + ledger.balls_pending_stealth_launch()
        + ledger.balls_stealth_in_play();
    assert_eq!(sum, ledger.total_balls(), "partition broken: {:?}", ledger.snapshot());
    assert!(ledger.check_invariant());
    assert!(ledger.matches_device(device));
    assert!(machine.snapshot().accounts_balanced);
}

/// Start a game with one ball in play and every lock lit.
fn game_with_lit_locks(machine: &mut Machine) {
    machine.start_game().unwrap();
    machine.launch_completed();
    assert!(machine.qualify_locks().unwrap());
    assert!(machine.device().lock_enabled());
}

fn lock_and_replace(machine: &mut Machine) {
    fixtures::lock_ball(machine);
    assert_balanced(machine);
    if machine.ledger().balls_pending_feed() > 0 {
        machine.launch_completed();
    }
}

#[test]
fn test_three_locks_eject_all_and_count_down() {
    let actuators = MockActuators::new();
    let launcher = MockLauncher::new();
    let mut machine = fixtures::machine(&actuators, &launcher);
    game_with_lit_locks(&mut machine);

    lock_and_replace(&mut machine);
    assert_eq!(machine.device().locked_count(), 1);
    lock_and_replace(&mut machine);
    assert_eq!(machine.device().locked_count(), 2);
    assert_eq!(machine.device().pending_eject(), 0);

    fixtures::lock_ball(&mut machine);
    assert_balanced(&machine);
    assert_eq!(machine.device().locked_count(), 3);
    assert_eq!(machine.device().pending_eject(), 3);
    assert!(machine.device().eject_in_progress());
    assert!(!machine.device().lock_enabled());

    let mut pending = vec![machine.device().pending_eject()];
    for _ in 0..3 {
        fixtures::release_one(&mut machine);
        assert_balanced(&machine);
        pending.push(machine.device().pending_eject());
    }

    assert_eq!(pending, vec![3, 2, 1, 0]);
    assert_eq!(machine.device().locked_count(), 0);
    assert!(!machine.device().eject_in_progress());
    assert_eq!(machine.ledger().balls_in_play(), 3);
    assert_eq!(machine.balls_requested(), 3);
}

#[test]
fn test_sum_invariant_holds_mid_sequence_for_both_strategies() {
    for config in [fixtures::machine_config(), fixtures::fast_machine_config()] {
        let actuators = MockActuators::new();
        let launcher = MockLauncher::new();
        let mut machine = fixtures::machine_with_config(config, &actuators, &launcher);
        game_with_lit_locks(&mut machine);

        lock_and_replace(&mut machine);
        lock_and_replace(&mut machine);
        fixtures::lock_ball(&mut machine);
        assert_balanced(&machine);

        run_machine_until_idle(&mut machine);

        assert_eq!(machine.device().locked_count(), 0);
        assert_eq!(machine.device().pending_eject(), 0);
        assert_eq!(machine.balls_requested(), 3);
    }
}

#[test]
fn test_both_strategies_converge_from_spinning() {
    for strategy in [EjectStrategy::Conservative, EjectStrategy::Fast] {
        let mut harness = DeviceHarness::new(strategy);
        harness.capture();
        harness.capture();
        assert_eq!(harness.device.rotation_phase(), RotationPhase::Spinning);

        assert_eq!(harness.device.request_eject(2, &mut harness.timers), 2);
        harness.run_until_idle();

        assert_eq!(harness.device.locked_count(), 0, "{:?}", strategy);
        assert_eq!(harness.device.pending_eject(), 0, "{:?}", strategy);
        assert_eq!(harness.releases(), 2);
        assert_eq!(harness.sequences_finished(), 1);
        assert_eq!(harness.device.rotation_phase(), RotationPhase::Stopped);
    }
}

#[test]
fn test_fast_strategy_converges_when_prepositioned_during_settle() {
    let mut harness = DeviceHarness::new(EjectStrategy::Fast);
    for _ in 0..3 {
        harness.capture();
    }
    harness.device.request_eject(3, &mut harness.timers);

    for _ in 0..MAX_STEPS {
        if !harness.device.eject_in_progress() {
            break;
        }
        if harness.device.eject_phase() == EjectPhase::Settling
            && harness.device.rotation_phase() == RotationPhase::Seeking
        {
            // The holder reaches the station before the settle window ends.
            harness.switch(SwitchEvent::inactive(Switch::PlanetPosition));
            harness.switch(SwitchEvent::active(Switch::PlanetPosition));
            assert_eq!(harness.device.rotation_phase(), RotationPhase::AtRelease);
        }
        harness.step();
    }

    assert!(!harness.device.eject_in_progress());
    assert_eq!(harness.device.locked_count(), 0);
    assert_eq!(harness.device.pending_eject(), 0);
    assert_eq!(harness.releases(), 3);
    assert!(!harness.actuators.has_rule(orrery_core::hardware::RuleId::PlanetAutoStop));
}

#[test]
fn test_fast_strategy_skips_alignment_when_parked() {
    let mut harness = DeviceHarness::new(EjectStrategy::Fast);
    // Parked at the release station with the motor off.
    harness.switch(SwitchEvent::active(Switch::PlanetPosition));
    assert_eq!(harness.device.rotation_phase(), RotationPhase::Stopped);

    assert_eq!(
        harness.device.recover(&mut harness.timers),
        RecoveryOutcome::SearchCycle
    );
    assert_eq!(harness.device.eject_phase(), EjectPhase::MagnetEngaged);

    harness.run_until_idle();
    assert_eq!(harness.device.locked_count(), 0);
    assert_eq!(harness.releases(), 0);
}

#[test]
fn test_fast_request_during_last_settle_turns_holder_first() {
    let mut harness = DeviceHarness::new(EjectStrategy::Fast);
    harness.capture();
    harness.capture();
    harness.device.request_eject(1, &mut harness.timers);

    for _ in 0..MAX_STEPS {
        if harness.device.eject_phase() == EjectPhase::Settling {
            break;
        }
        harness.step();
    }
    assert_eq!(harness.device.eject_phase(), EjectPhase::Settling);
    assert_eq!(harness.device.pending_eject(), 0);

    // Another eject arrives while the last ball settles.
    assert_eq!(harness.device.request_eject(1, &mut harness.timers), 1);
    let crane_pulses = harness.actuators.pulse_count(Coil::Crane);
    harness.step();
    assert_eq!(harness.device.eject_phase(), EjectPhase::Aligning);
    assert_eq!(harness.actuators.pulse_count(Coil::Crane), crane_pulses);

    harness.run_until_idle();
    assert_eq!(harness.device.locked_count(), 0);
    assert_eq!(harness.device.pending_eject(), 0);
    assert_eq!(harness.releases(), 2);
    assert_eq!(harness.sequences_finished(), 1);
}

#[test]
fn test_eject_requests_during_sequence_coalesce() {
    for strategy in [EjectStrategy::Conservative, EjectStrategy::Fast] {
        let mut harness = DeviceHarness::new(strategy);
        for _ in 0..3 {
            harness.capture();
        }

        harness.device.request_eject(1, &mut harness.timers);
        harness.step();
        let phase = harness.device.eject_phase();
        assert_eq!(phase, EjectPhase::MagnetEngaged);

        assert_eq!(harness.device.request_eject(2, &mut harness.timers), 2);
        assert_eq!(harness.device.pending_eject(), 3);
        assert_eq!(harness.device.eject_phase(), phase);
        assert!(harness.timers.is_pending(TimerKey::Device(
            orrery_core::timers::DeviceTimer::MagnetHold
        )));

        let magnet_enables_before = harness
            .actuators
            .commands()
            .iter()
            .filter(|c| **c == ActuatorCommand::Enable(Coil::Magnet))
            .count();
        assert_eq!(magnet_enables_before, 1);

        harness.run_until_idle();
        assert_eq!(harness.releases(), 3);
        assert_eq!(harness.sequences_finished(), 1);
        assert_eq!(harness.device.locked_count(), 0);
    }
}

#[test]
fn test_counts_stay_within_ball_complement() {
    let mut harness = DeviceHarness::new(EjectStrategy::Conservative);
    for _ in 0..8 {
        harness.capture();
    }
    assert_eq!(harness.device.locked_count(), 5);

    assert_eq!(harness.device.request_eject(10, &mut harness.timers), 5);
    assert_eq!(harness.device.request_eject(1, &mut harness.timers), 0);
    assert_eq!(harness.device.pending_eject(), 5);

    harness.run_until_idle();
    assert_eq!(harness.device.locked_count(), 0);
    assert_eq!(harness.device.pending_eject(), 0);

    // Stray arm triggers on an idle, empty holder change nothing.
    harness.switch(SwitchEvent::active(Switch::ReleaseArm));
    harness.switch(SwitchEvent::inactive(Switch::ReleaseArm));
    assert_eq!(harness.device.locked_count(), 0);
    assert_eq!(harness.device.request_eject(1, &mut harness.timers), 0);
}

#[test]
fn test_recover_kicks_stalled_seek_and_still_converges() {
    let mut harness = DeviceHarness::new(EjectStrategy::Conservative);
    harness.capture();
    harness.device.request_eject(1, &mut harness.timers);
    assert_eq!(harness.device.eject_phase(), EjectPhase::Seeking);

    // The position sensor never fires; the ball search re-drives the motor.
    harness.actuators.clear_commands();
    assert_eq!(
        harness.device.recover(&mut harness.timers),
        RecoveryOutcome::Kick
    );
    assert!(harness
        .actuators
        .commands()
        .contains(&ActuatorCommand::Enable(Coil::PlanetMotor)));
    assert_eq!(harness.device.pending_eject(), 1);

    harness.run_until_idle();
    assert_eq!(harness.device.locked_count(), 0);
    assert_eq!(harness.releases(), 1);
}

#[test]
fn test_recover_on_idle_holder_with_locks_is_noop() {
    let mut harness = DeviceHarness::new(EjectStrategy::Fast);
    harness.capture();
    harness.actuators.clear_commands();

    assert_eq!(
        harness.device.recover(&mut harness.timers),
        RecoveryOutcome::Noop
    );
    assert!(harness.actuators.commands().is_empty());
    assert_eq!(harness.device.locked_count(), 1);
    assert!(!harness.device.eject_in_progress());
}

#[test]
fn test_search_cycle_on_empty_holder_is_count_neutral() {
    let actuators = MockActuators::new();
    let launcher = MockLauncher::new();
    let mut machine = fixtures::machine(&actuators, &launcher);
    machine.start_game().unwrap();
    machine.launch_completed();

    assert_eq!(machine.perform_ball_search(), RecoveryOutcome::SearchCycle);
    run_machine_until_idle(&mut machine);

    assert_eq!(machine.device().locked_count(), 0);
    assert_eq!(machine.ledger().balls_in_play(), 1);
    assert_eq!(machine.balls_requested(), 1);
    assert_balanced(&machine);
}
