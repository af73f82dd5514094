//! Background control loop.
//!
//! [`ControllerHandle::spawn`] moves a [`Controller`] and its driver,
//! clock and event sink behind a mutex and starts one thread that ticks
//! at the configured period.  Other threads talk to it through the
//! handle:
//!
//! ```text
//! ┌─────────────┐  Readings   ┌───────────────┐
//! │  ingestion  │───────────▶│ sample channel │──┐ drained at the
//! └─────────────┘  try_send   └───────────────┘  │ top of each tick
//!                                                ▼
//! ┌─────────────┐  commands   ┌───────────────────────────┐
//! │  operator   │───────────▶│ Mutex<Core> · control loop │
//! └─────────────┘  (locked)   └───────────────────────────┘
//! ```
//!
//! Ingestion never takes the lock: it pushes into a bounded `embassy-sync`
//! channel and drops the batch if the channel is full.  Mode changes and
//! status queries lock the core, so a tick always sees a mode change
//! atomically.  A tick that panics is logged and the loop carries on with
//! the next one.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Context;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{error, info, warn};

use crate::app::commands::ControlCommand;
use crate::app::events::ControllerEvent;
use crate::app::ports::{ActuatorPort, ClockPort, EventSink};
use crate::app::service::Controller;
use crate::app::status::ControllerStatus;
use crate::config::ControllerConfig;
use crate::drivers::relay::Relay;
use crate::sensors::Readings;
use crate::sensors::feed::parse_line;

/// Sample batches buffered between ticks.
const SAMPLE_DEPTH: usize = 32;

type SampleChannel = Channel<CriticalSectionRawMutex, Readings, SAMPLE_DEPTH>;

struct Core {
    controller: Controller,
    driver: Box<dyn ActuatorPort + Send>,
    clock: Box<dyn ClockPort + Send>,
    sink: Box<dyn EventSink + Send>,
}

impl Core {
    fn drain(&mut self, samples: &SampleChannel) {
        while let Ok(readings) = samples.try_receive() {
            self.controller.update_sensors(&readings, self.sink.as_mut());
        }
    }

    fn tick(&mut self) {
        self.controller
            .tick(self.driver.as_mut(), self.clock.as_ref(), self.sink.as_mut());
    }

    fn set_override(&mut self, on: bool) {
        self.controller
            .set_override(on, self.driver.as_mut(), self.clock.as_ref(), self.sink.as_mut());
    }

    fn set_calibration(&mut self, on: bool) {
        self.controller.set_calibration(on, self.sink.as_mut());
    }

    fn command(&mut self, cmd: ControlCommand) -> crate::Result<()> {
        self.controller.handle_command(
            cmd,
            self.driver.as_mut(),
            self.clock.as_ref(),
            self.sink.as_mut(),
        )
    }
}

struct Shared {
    core: Mutex<Core>,
    samples: SampleChannel,
    stop: AtomicBool,
    dropped: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the core with every queued sample applied.
    fn lock_drained(&self) -> MutexGuard<'_, Core> {
        let mut core = self.lock();
        core.drain(&self.samples);
        core
    }
}

// ───────────────────────────────────────────────────────────────
// Handle
// ───────────────────────────────────────────────────────────────

/// Owner of the control thread.  Dropping it stops the loop.
pub struct ControllerHandle {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl ControllerHandle {
    /// Validate `config`, build the controller and start ticking.
    pub fn spawn<D, C, S>(config: ControllerConfig, driver: D, clock: C, sink: S) -> anyhow::Result<Self>
    where
        D: ActuatorPort + Send + 'static,
        C: ClockPort + Send + 'static,
        S: EventSink + Send + 'static,
    {
        config.validate().context("invalid controller config")?;
        let period = config.timing.tick_interval();

        let shared = Arc::new(Shared {
            core: Mutex::new(Core {
                controller: Controller::new(config),
                driver: Box::new(driver),
                clock: Box::new(clock),
                sink: Box::new(sink),
            }),
            samples: Channel::new(),
            stop: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        });

        let worker = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("hydroctl-loop".into())
            .spawn(move || control_loop(&worker, period))
            .context("failed to spawn control thread")?;

        info!("control loop started, tick {:?}", period);
        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    // ── Ingestion ─────────────────────────────────────────────

    /// Queue `name → value` pairs for the next tick.  Never blocks.
    ///
    /// Returns `false` if the queue was full and the batch was dropped.
    pub fn update_sensors<K, I>(&self, pairs: I) -> bool
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f32)>,
    {
        self.push_readings(Readings::from_pairs(pairs))
    }

    /// Queue an already decoded batch.  Never blocks.
    pub fn push_readings(&self, readings: Readings) -> bool {
        if self.shared.samples.try_send(readings).is_err() {
            warn!("sample queue full, dropping batch");
            self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Decode one line of sensor-node output and queue its readings.
    pub fn push_line(&self, line: &str) -> crate::Result<bool> {
        let frame = parse_line(line)?;
        Ok(self.push_readings(frame.readings))
    }

    /// Batches dropped because the queue was full.
    pub fn dropped_batches(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    // ── Operator surface ──────────────────────────────────────

    pub fn set_override(&self, on: bool) {
        self.shared.lock_drained().set_override(on);
    }

    pub fn set_calibration(&self, on: bool) {
        self.shared.lock_drained().set_calibration(on);
    }

    pub fn manual_set(&self, relay: Relay, on: bool) -> crate::Result<()> {
        self.shared
            .lock_drained()
            .command(ControlCommand::ManualRelay { relay, on })
    }

    pub fn status(&self) -> ControllerStatus {
        let core = self.shared.lock_drained();
        core.controller.status(core.clock.as_ref())
    }

    /// Stop the loop after the current tick and join the thread.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.shared.stop.store(true, Ordering::Release);
        thread.thread().unpark();
        if thread.join().is_err() {
            error!("control thread panicked");
        } else {
            info!("control loop stopped");
        }
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ───────────────────────────────────────────────────────────────
// Loop
// ───────────────────────────────────────────────────────────────

fn control_loop(shared: &Shared, period: Duration) {
    let mut deadline = Instant::now();
    let mut reported_drops = 0;

    while !shared.stop.load(Ordering::Acquire) {
        {
            let mut core = shared.lock_drained();
            let dropped = shared.dropped.load(Ordering::Relaxed);
            if dropped > reported_drops {
                core.sink.emit(&ControllerEvent::SamplesDropped);
                reported_drops = dropped;
            }
            if panic::catch_unwind(AssertUnwindSafe(|| core.tick())).is_err() {
                error!("control tick panicked, continuing with the next one");
            }
        }

        deadline += period;
        let now = Instant::now();
        if now > deadline + period {
            warn!("control loop overran by {:?}", now - deadline);
            deadline = now;
        }
        wait_until(shared, deadline);
    }
}

/// Park until `deadline` or until `stop` is raised.
fn wait_until(shared: &Shared, deadline: Instant) {
    loop {
        if shared.stop.load(Ordering::Acquire) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::park_timeout(deadline - now);
    }
}
