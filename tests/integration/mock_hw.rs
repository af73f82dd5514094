//! Mock adapters for integration tests.
//!
//! Every mock is a cheap `Clone` over shared state, so a test can hand one
//! copy to the controller (or to a worker thread) and keep another to
//! inspect the recorded history.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use hydroctl::app::events::ControllerEvent;
use hydroctl::app::ports::{ActuatorPort, ClockPort, EventSink};
use hydroctl::drivers::relay::Relay;

// ── Relay driver ──────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockRelays {
    calls: Arc<Mutex<Vec<(u8, bool)>>>,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockRelays {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(relay_id, on)` the driver was called with, in order.
    pub fn calls(&self) -> Vec<(u8, bool)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn calls_for(&self, relay: Relay) -> Vec<bool> {
        self.calls()
            .into_iter()
            .filter(|(id, _)| *id == relay.id())
            .map(|(_, on)| on)
            .collect()
    }

    pub fn last_for(&self, relay: Relay) -> Option<bool> {
        self.calls_for(relay).last().copied()
    }

    /// Make every subsequent call fail (the call is still recorded).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ActuatorPort for MockRelays {
    fn set_relay(&mut self, relay: Relay, on: bool) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push((relay.id(), on));
        if self.failing.load(Ordering::SeqCst) {
            bail!("relay board not responding");
        }
        Ok(())
    }
}

// ── Clock ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
    hour: Arc<AtomicU8>,
}

#[allow(dead_code)]
impl ManualClock {
    /// Clock at t=0 s and the given local hour.
    pub fn at_hour(hour: u8) -> Self {
        Self {
            now: Arc::new(Mutex::new(Duration::ZERO)),
            hour: Arc::new(AtomicU8::new(hour)),
        }
    }

    pub fn advance(&self, secs: u64) {
        *self.now.lock().unwrap() += Duration::from_secs(secs);
    }

    pub fn set_secs(&self, secs: u64) {
        *self.now.lock().unwrap() = Duration::from_secs(secs);
    }

    pub fn secs(&self) -> u64 {
        self.now.lock().unwrap().as_secs()
    }

    pub fn set_hour(&self, hour: u8) {
        self.hour.store(hour, Ordering::SeqCst);
    }
}

impl ClockPort for ManualClock {
    fn monotonic(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    fn local_hour(&self) -> u8 {
        self.hour.load(Ordering::SeqCst)
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ControllerEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ControllerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&ControllerEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ControllerEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
