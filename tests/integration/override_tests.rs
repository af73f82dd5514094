//! Manual override, resync on release, and manual relay control.

use hydroctl::app::commands::ControlCommand;
use hydroctl::app::events::ControllerEvent;
use hydroctl::drivers::relay::{Relay, RelayState};
use hydroctl::fsm::Mode;
use hydroctl::Error;

use super::controller_tests::Rig;

#[test]
fn entering_override_stops_rule_writes() {
    let mut rig = Rig::new();
    rig.tick_at(0);
    rig.set_override(true);
    rig.hw.clear();

    rig.feed("do_mg_l", 5.0, 3);
    for t in 1..=30 {
        rig.tick_at(t);
    }
    assert!(rig.hw.calls().is_empty(), "no rules and no enforcement while overridden");
    assert_eq!(rig.state(Relay::AirPump), RelayState::Off);
    assert_eq!(rig.ctl.mode(), Mode::Overridden);
}

#[test]
fn manual_relay_only_while_overridden() {
    let mut rig = Rig::new();
    let err = rig
        .ctl
        .manual_set(Relay::ExhaustIn, true, &mut rig.hw, &rig.clock, &mut rig.sink)
        .unwrap_err();
    assert_eq!(
        err,
        Error::ManualControl {
            relay: Relay::ExhaustIn,
            mode: Mode::Running,
        }
    );
    assert!(rig.hw.calls().is_empty());

    rig.set_override(true);
    rig.ctl
        .manual_set(Relay::ExhaustIn, true, &mut rig.hw, &rig.clock, &mut rig.sink)
        .unwrap();
    assert_eq!(rig.hw.calls(), vec![(Relay::ExhaustIn.id(), true)]);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, ControllerEvent::ManualSet { .. })),
        1
    );

    // Forced: a second change inside the debounce window still lands.
    rig.ctl
        .manual_set(Relay::ExhaustIn, false, &mut rig.hw, &rig.clock, &mut rig.sink)
        .unwrap();
    assert_eq!(rig.hw.last_for(Relay::ExhaustIn), Some(false));
}

#[test]
fn manual_relay_rejected_during_calibration() {
    let mut rig = Rig::new();
    rig.set_override(true);
    rig.ctl.set_calibration(true, &mut rig.sink);
    let result = rig.ctl.handle_command(
        ControlCommand::ManualRelay {
            relay: Relay::Misting,
            on: true,
        },
        &mut rig.hw,
        &rig.clock,
        &mut rig.sink,
    );
    assert!(matches!(
        result,
        Err(Error::ManualControl {
            mode: Mode::CalibrationSuspended,
            ..
        })
    ));
    assert!(rig.hw.calls().is_empty());
}

#[test]
fn releasing_override_resyncs_every_resolvable_relay_once() {
    let mut rig = Rig::new();
    rig.feed("do_mg_l", 6.5, 2);
    rig.tick_at(0);
    assert!(rig.state(Relay::AirPump).is_on());

    rig.set_override(true);
    rig.clock.set_secs(1);
    rig.ctl
        .manual_set(Relay::AirPump, false, &mut rig.hw, &rig.clock, &mut rig.sink)
        .unwrap();
    rig.hw.clear();
    rig.sink.clear();

    // No tick: the resync runs inside set_override(false).
    rig.clock.set_secs(2);
    rig.set_override(false);

    let calls = rig.hw.calls();
    for relay in Relay::ALL {
        let n = calls.iter().filter(|(id, _)| *id == relay.id()).count();
        assert!(n <= 1, "{} written {} times", relay.label(), n);
    }
    assert!(calls.contains(&(Relay::AirPump.id(), true)));
    assert!(calls.contains(&(Relay::GrowLightsAero.id(), true)));
    assert!(calls.contains(&(Relay::GrowLightsDwc.id(), true)));
    assert!(calls.contains(&(Relay::Misting.id(), false)));
    assert_eq!(calls.len(), 4);

    // Sensor-gated rules without data leave their relays unknown.
    assert_eq!(rig.state(Relay::ExhaustIn), RelayState::Unknown);
    assert_eq!(rig.state(Relay::PhUp), RelayState::Unknown);
    assert_eq!(rig.state(Relay::LeafyGreen), RelayState::Unknown);

    let events = rig.sink.events();
    assert!(events.contains(&ControllerEvent::Resynced));
    assert!(events.contains(&ControllerEvent::ModeChanged {
        from: Mode::Overridden,
        to: Mode::Running,
    }));
}

#[test]
fn unknown_relays_are_skipped_by_enforcement() {
    let mut rig = Rig::new();
    rig.tick_at(0);
    rig.set_override(true);
    rig.set_override(false);
    rig.hw.clear();

    rig.tick_at(10);
    let calls = rig.hw.calls();
    assert!(!calls.iter().any(|(id, _)| *id == Relay::ExhaustIn.id()));
    assert!(calls.contains(&(Relay::GrowLightsAero.id(), true)));
}

#[test]
fn override_release_during_calibration_waits_for_running() {
    let mut rig = Rig::new();
    rig.tick_at(0);
    rig.ctl.set_calibration(true, &mut rig.sink);
    rig.set_override(true);
    rig.hw.clear();

    rig.set_override(false);
    assert!(rig.hw.calls().is_empty(), "calibration forbids the resync writes");
    assert!(Relay::ALL.iter().all(|r| rig.state(*r) == RelayState::Unknown));

    rig.ctl.set_calibration(false, &mut rig.sink);
    rig.tick_at(1);
    assert!(rig.state(Relay::GrowLightsAero).is_on());
    assert_eq!(rig.state(Relay::Misting), RelayState::Off);
}

#[test]
fn override_toggles_are_idempotent() {
    let mut rig = Rig::new();
    rig.set_override(true);
    rig.set_override(true);
    rig.set_override(false);
    rig.set_override(false);
    assert_eq!(
        rig.sink
            .count(|e| *e == ControllerEvent::Resynced),
        1
    );
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, ControllerEvent::ModeChanged { .. })),
        2
    );
}
