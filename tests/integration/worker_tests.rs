//! Background worker: real thread, short tick, mock driver.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use hydroctl::app::status::ControllerStatus;
use hydroctl::config::ControllerConfig;
use hydroctl::drivers::relay::{Relay, RelayState};
use hydroctl::fsm::Mode;
use hydroctl::ControllerHandle;

use super::mock_hw::{ManualClock, MockRelays, RecordingSink};

fn config(tick_ms: u64) -> ControllerConfig {
    let mut cfg = ControllerConfig::default();
    cfg.timing.tick_interval_ms = tick_ms;
    cfg
}

fn spawn(tick_ms: u64) -> (ControllerHandle, MockRelays, ManualClock, RecordingSink) {
    let hw = MockRelays::new();
    let clock = ManualClock::at_hour(10);
    let sink = RecordingSink::new();
    let handle =
        ControllerHandle::spawn(config(tick_ms), hw.clone(), clock.clone(), sink.clone()).unwrap();
    (handle, hw, clock, sink)
}

/// Poll `status()` until `pred` holds or two seconds pass.
fn wait_for(handle: &ControllerHandle, pred: impl Fn(&ControllerStatus) -> bool) -> ControllerStatus {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let status = handle.status();
        if pred(&status) || Instant::now() > deadline {
            return status;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn spawn_rejects_invalid_config() {
    let mut cfg = config(10);
    cfg.thresholds.ph.low = 8.0;
    let result = ControllerHandle::spawn(
        cfg,
        MockRelays::new(),
        ManualClock::at_hour(10),
        RecordingSink::new(),
    );
    assert!(result.is_err());
}

#[test]
fn worker_ticks_and_applies_queued_samples() {
    let (handle, hw, clock, _sink) = spawn(10);

    assert!(handle.update_sensors([("do_mg_l", 6.0), ("do", 6.0)]));
    assert!(handle.push_line(r#"{"device":"node-1","readings":{"do":6.0}}"#).unwrap());
    assert!(handle.push_line("not json").is_err());
    clock.advance(1);

    let status = wait_for(&handle, |s| s.relay(Relay::AirPump) == RelayState::On);
    assert_eq!(status.relay(Relay::AirPump), RelayState::On);
    assert!(status.tick_count > 0);
    assert!(hw.calls().contains(&(Relay::AirPump.id(), true)));
    assert!(hw.calls().contains(&(Relay::GrowLightsAero.id(), true)));

    handle.stop();
}

#[test]
fn mode_changes_through_the_handle() {
    let (handle, hw, _clock, _sink) = spawn(10);
    wait_for(&handle, |s| s.tick_count > 0);

    assert!(handle.manual_set(Relay::Misting, true).is_err());

    handle.set_override(true);
    assert_eq!(handle.status().mode, Mode::Overridden);
    handle.manual_set(Relay::PhDown, true).unwrap();
    assert_eq!(hw.last_for(Relay::PhDown), Some(true));

    handle.set_calibration(true);
    let status = handle.status();
    assert_eq!(status.mode, Mode::CalibrationSuspended);
    assert!(status.override_mode);
    assert!(status.calibration_mode);

    handle.set_calibration(false);
    handle.set_override(false);
    assert_eq!(handle.status().mode, Mode::Running);
    handle.stop();
}

#[test]
fn panicking_driver_does_not_stop_the_loop() {
    let panicked = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&panicked);
    let driver = move |_id: u8, _on: bool| -> anyhow::Result<()> {
        if !flag.swap(true, Ordering::SeqCst) {
            panic!("relay board fault");
        }
        Ok(())
    };
    let handle = ControllerHandle::spawn(
        config(10),
        driver,
        ManualClock::at_hour(10),
        RecordingSink::new(),
    )
    .unwrap();

    let status = wait_for(&handle, |s| s.tick_count >= 5);
    assert!(panicked.load(Ordering::SeqCst));
    assert!(status.tick_count >= 5, "loop stalled at tick {}", status.tick_count);
    handle.stop();
}

#[test]
fn full_queue_drops_batches_without_blocking() {
    // One tick at start, then the loop parks for a minute.
    let (handle, _hw, _clock, _sink) = spawn(60_000);

    let mut rejected = 0;
    for _ in 0..100 {
        if !handle.update_sensors([("ph", 6.0)]) {
            rejected += 1;
        }
    }
    assert!(rejected > 0);
    assert_eq!(handle.dropped_batches(), rejected);

    let status = handle.status();
    assert_eq!(status.filters[2].samples, 10, "window of the pH filter is full");

    // stop() must not wait out the tick period.
    let started = Instant::now();
    handle.stop();
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn dropping_the_handle_stops_the_thread() {
    let (handle, hw, _clock, _sink) = spawn(10);
    wait_for(&handle, |s| s.tick_count > 0);
    drop(handle);

    let before = hw.calls().len();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(hw.calls().len(), before);
}
