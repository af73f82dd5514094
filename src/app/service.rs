//! Controller service: the hexagonal core.
//!
//! [`Controller`] owns the sensor filters, relay states, rule timers and
//! mode flags.  It never sleeps and never spawns: the caller drives it
//! with [`Controller::tick`] and hands in the driver, clock and event sink
//! at each call site.  The threaded wrapper lives in [`crate::worker`].
//!
//! ```text
//!  Readings ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!               │        Controller        │
//! ActuatorPort ◀│ Filters · Rules · Relays │◀── ClockPort
//!               └──────────────────────────┘
//! ```

use core::time::Duration;

use log::{info, warn};

use crate::config::ControllerConfig;
use crate::control::rules::{RuleContext, RuleEngine};
use crate::drivers::relay::{Relay, RelayBank, RelayState};
use crate::error::{Error, Result};
use crate::fsm::{Mode, ModeEdge, ModeFlags};
use crate::sensors::feed::parse_line;
use crate::sensors::{Readings, SensorBank, SensorKind};

use super::commands::ControlCommand;
use super::events::ControllerEvent;
use super::ports::{ActuatorPort, ClockPort, EventSink};
use super::status::{ControllerStatus, FilterStatus, FilteredValues, RelayStatus};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller {
    config: ControllerConfig,
    sensors: SensorBank,
    relays: RelayBank,
    rules: RuleEngine,
    flags: ModeFlags,
    /// Time of the last enforcement pass; `None` makes the next tick enforce.
    last_enforce: Option<Duration>,
    tick_count: u64,
}

impl Controller {
    /// Build a controller from an already validated configuration.
    pub fn new(config: ControllerConfig) -> Self {
        let sensors = SensorBank::new(config.filter_window);
        let relays = RelayBank::new(config.timing.debounce());
        let rules = RuleEngine::new(&config);
        Self {
            config,
            sensors,
            relays,
            rules,
            flags: ModeFlags::default(),
            last_enforce: None,
            tick_count: 0,
        }
    }

    /// Validate `config` first.
    pub fn try_new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    // ── Ingestion ─────────────────────────────────────────────

    /// Feed one batch of samples into the filters.
    pub fn update_sensors(&mut self, readings: &Readings, sink: &mut dyn EventSink) {
        if readings.ignored() > 0 {
            warn!("ignored {} unknown sensor key(s)", readings.ignored());
        }
        self.sensors.ingest(readings, sink);
    }

    /// Decode one line of sensor-node output and feed it.
    pub fn ingest_line(&mut self, line: &str, sink: &mut dyn EventSink) -> Result<()> {
        let frame = parse_line(line)?;
        self.update_sensors(&frame.readings, sink);
        Ok(())
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: rules, then periodic enforcement.
    ///
    /// Both steps are skipped unless the controller is `Running`.
    pub fn tick(
        &mut self,
        hw: &mut dyn ActuatorPort,
        clock: &dyn ClockPort,
        sink: &mut dyn EventSink,
    ) {
        self.tick_count += 1;
        if !self.mode().is_automatic() {
            return;
        }

        let now = clock.monotonic();
        let daytime = self.config.timing.is_daytime(clock.local_hour());
        self.evaluate_rules(now, daytime, hw, sink);

        let due = self
            .last_enforce
            .is_none_or(|t| now.saturating_sub(t) >= self.config.timing.enforce_interval());
        if due {
            let count = self.relays.reassert_known(hw, sink);
            self.last_enforce = Some(now);
            sink.emit(&ControllerEvent::Enforced { count });
        }
    }

    fn evaluate_rules(
        &mut self,
        now: Duration,
        daytime: bool,
        hw: &mut dyn ActuatorPort,
        sink: &mut dyn EventSink,
    ) {
        let mut ctx = RuleContext {
            sensors: &self.sensors,
            relays: &mut self.relays,
            hw,
            sink,
            now,
            daytime,
        };
        self.rules.evaluate(&mut ctx);
    }

    // ── Mode control ──────────────────────────────────────────

    /// Enter or leave manual override.  Idempotent.
    ///
    /// Leaving override forgets every relay state and, if the controller
    /// is back to `Running`, immediately runs one rule pass so each relay
    /// the rules can decide is written to the driver again.
    pub fn set_override(
        &mut self,
        on: bool,
        hw: &mut dyn ActuatorPort,
        clock: &dyn ClockPort,
        sink: &mut dyn EventSink,
    ) {
        let from = self.mode();
        let Some(edge) = self.flags.set_override(on) else {
            return;
        };
        if edge == ModeEdge::OverrideExited {
            self.resync(hw, clock, sink);
        }
        self.report_mode_change(from, sink);
    }

    /// Enter or leave calibration suspension.  Idempotent.
    ///
    /// Filters and rule timers survive the suspension, so a dosing valve
    /// left open when calibration began is closed by the first tick after.
    pub fn set_calibration(&mut self, on: bool, sink: &mut dyn EventSink) {
        let from = self.mode();
        if self.flags.set_calibration(on).is_none() {
            return;
        }
        self.report_mode_change(from, sink);
    }

    fn resync(&mut self, hw: &mut dyn ActuatorPort, clock: &dyn ClockPort, sink: &mut dyn EventSink) {
        self.relays.mark_all_unknown();
        if self.mode().is_automatic() {
            let now = clock.monotonic();
            let daytime = self.config.timing.is_daytime(clock.local_hour());
            self.evaluate_rules(now, daytime, hw, sink);
        }
        info!("override released, relays resynced");
        sink.emit(&ControllerEvent::Resynced);
    }

    fn report_mode_change(&self, from: Mode, sink: &mut dyn EventSink) {
        let to = self.mode();
        if from != to {
            info!("mode {:?} -> {:?}", from, to);
            sink.emit(&ControllerEvent::ModeChanged { from, to });
        }
    }

    // ── Manual control ────────────────────────────────────────

    /// Switch `relay` by hand.  Only accepted while `Overridden`.
    pub fn manual_set(
        &mut self,
        relay: Relay,
        on: bool,
        hw: &mut dyn ActuatorPort,
        clock: &dyn ClockPort,
        sink: &mut dyn EventSink,
    ) -> Result<bool> {
        let mode = self.mode();
        if mode.is_automatic() || !mode.allows_writes() {
            warn!("manual {} rejected in {:?}", relay.label(), mode);
            return Err(Error::ManualControl { relay, mode });
        }
        let changed = self.relays.drive(relay, on, true, clock.monotonic(), hw, sink);
        sink.emit(&ControllerEvent::ManualSet { relay, on });
        Ok(changed)
    }

    /// Dispatch an operator command.
    pub fn handle_command(
        &mut self,
        cmd: ControlCommand,
        hw: &mut dyn ActuatorPort,
        clock: &dyn ClockPort,
        sink: &mut dyn EventSink,
    ) -> Result<()> {
        match cmd {
            ControlCommand::SetOverride(on) => self.set_override(on, hw, clock, sink),
            ControlCommand::SetCalibration(on) => self.set_calibration(on, sink),
            ControlCommand::ManualRelay { relay, on } => {
                self.manual_set(relay, on, hw, clock, sink)?;
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self, clock: &dyn ClockPort) -> ControllerStatus {
        let value = |k| self.sensors.value(k);
        ControllerStatus {
            mode: self.mode(),
            override_mode: self.flags.override_mode,
            calibration_mode: self.flags.calibration_mode,
            is_daytime: self.config.timing.is_daytime(clock.local_hour()),
            filtered_values: FilteredValues {
                temperature: value(SensorKind::Temperature),
                humidity: value(SensorKind::Humidity),
                ph: value(SensorKind::Ph),
                dissolved_oxygen: value(SensorKind::DissolvedOxygen),
                tds: value(SensorKind::Tds),
            },
            filters: SensorKind::ALL.map(|k| FilterStatus::new(k, self.sensors.filter(k))),
            relay_states: Relay::ALL.map(|r| RelayStatus::new(r, self.relays.state(r))),
            thresholds: self.config.thresholds,
            nutrient_dosing_active: self.rules.nutrient_active(),
            tick_count: self.tick_count,
        }
    }

    pub fn mode(&self) -> Mode {
        self.flags.mode()
    }

    pub fn flags(&self) -> ModeFlags {
        self.flags
    }

    pub fn relay_state(&self, relay: Relay) -> RelayState {
        self.relays.state(relay)
    }

    pub fn sensors(&self) -> &SensorBank {
        &self.sensors
    }

    pub fn sensors_mut(&mut self) -> &mut SensorBank {
        &mut self.sensors
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
