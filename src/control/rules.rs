//! Rule engine: one rule per actuator group, evaluated every tick.
//!
//! | Rule        | Gate                   | Relays                          |
//! |-------------|------------------------|---------------------------------|
//! | air pump    | DO fast-ready          | AIR_PUMP                        |
//! | exhaust     | temp or humidity ready | EXHAUST_IN + EXHAUST_OUT        |
//! | grow lights | none                   | GROW_LIGHTS_AERO + GROW_LIGHTS_DWC |
//! | pH up/down  | pH ready               | PH_UP, PH_DOWN (shared timer)   |
//! | nutrient    | TDS ready              | LEAFY_GREEN                     |
//! | misting     | none                   | MISTING                         |
//!
//! The rules touch disjoint relay sets, so evaluation order only matters
//! for the pH pair, which shares a single dose/cooldown deadline.

use core::time::Duration;

use crate::app::ports::{ActuatorPort, EventSink};
use crate::config::{ControllerConfig, Thresholds};
use crate::drivers::relay::{Relay, RelayBank, RelayState};
use crate::sensors::{SensorBank, SensorKind};

use super::pulse::PulseCycle;

/// Everything a rule pass reads and writes.
pub struct RuleContext<'a> {
    pub sensors: &'a SensorBank,
    pub relays: &'a mut RelayBank,
    pub hw: &'a mut dyn ActuatorPort,
    pub sink: &'a mut dyn EventSink,
    pub now: Duration,
    pub daytime: bool,
}

impl RuleContext<'_> {
    /// Debounced request.
    fn set(&mut self, relay: Relay, on: bool) -> bool {
        self.relays.drive(relay, on, false, self.now, self.hw, self.sink)
    }

    /// Forced request, for pulse timers shorter than the debounce.
    fn force(&mut self, relay: Relay, on: bool) -> bool {
        self.relays.drive(relay, on, true, self.now, self.hw, self.sink)
    }

    fn state(&self, relay: Relay) -> RelayState {
        self.relays.state(relay)
    }
}

/// Rule state: the pulse timers and the nutrient hysteresis flag.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    thresholds: Thresholds,
    ph_dose: Duration,
    ph_cooldown: Duration,
    /// Shared pH deadline: end of the current dose, then end of the cooldown.
    ph_dose_until: Option<Duration>,
    misting: PulseCycle,
    nutrient: PulseCycle,
    nutrient_active: bool,
}

impl RuleEngine {
    pub fn new(config: &ControllerConfig) -> Self {
        let t = &config.timing;
        Self {
            thresholds: config.thresholds,
            ph_dose: Duration::from_secs(t.ph_dose_secs),
            ph_cooldown: Duration::from_secs(t.ph_cooldown_secs),
            ph_dose_until: None,
            misting: PulseCycle::new(
                Duration::from_secs(t.misting_on_secs),
                Duration::from_secs(t.misting_off_secs),
            ),
            nutrient: PulseCycle::new(
                Duration::from_secs(t.nutrient_on_secs),
                Duration::from_secs(t.nutrient_off_secs),
            ),
            nutrient_active: false,
        }
    }

    /// Run every rule once.
    pub fn evaluate(&mut self, ctx: &mut RuleContext<'_>) {
        self.air_pump(ctx);
        self.exhaust(ctx);
        self.grow_lights(ctx);
        self.ph_dosing(ctx, Relay::PhUp);
        self.ph_dosing(ctx, Relay::PhDown);
        self.nutrient_dosing(ctx);
        self.misting(ctx);
    }

    pub fn nutrient_active(&self) -> bool {
        self.nutrient_active
    }

    pub fn ph_dose_until(&self) -> Option<Duration> {
        self.ph_dose_until
    }

    // ── Air pump ──────────────────────────────────────────────

    fn air_pump(&mut self, ctx: &mut RuleContext<'_>) {
        // Low DO kills roots fast; act on a short history.
        let sensors = ctx.sensors;
        let f = sensors.filter(SensorKind::DissolvedOxygen);
        if !f.fast_ready() {
            return;
        }
        let band = self.thresholds.dissolved_oxygen;
        let d_o = f.get();
        if d_o < band.low {
            ctx.set(Relay::AirPump, true);
        } else if d_o >= band.high {
            ctx.set(Relay::AirPump, false);
        }
    }

    // ── Exhaust pair ──────────────────────────────────────────

    fn exhaust(&mut self, ctx: &mut RuleContext<'_>) {
        let sensors = ctx.sensors;
        let temp = sensors.filter(SensorKind::Temperature);
        let humidity = sensors.filter(SensorKind::Humidity);
        if !temp.ready() && !humidity.ready() {
            return;
        }

        let mut needed = ctx.state(Relay::ExhaustIn).is_on();

        if temp.ready() {
            let band = if ctx.daytime {
                self.thresholds.temp_day
            } else {
                self.thresholds.temp_night
            };
            let t = temp.get();
            if t > band.high {
                needed = true;
            } else if t <= band.low {
                needed = false;
            }
        }

        // Humidity can only demand the exhaust, never release it.
        if humidity.ready() && humidity.get() > self.thresholds.humidity.high {
            needed = true;
        }

        ctx.set(Relay::ExhaustIn, needed);
        ctx.set(Relay::ExhaustOut, needed);
    }

    // ── Grow lights ───────────────────────────────────────────

    fn grow_lights(&mut self, ctx: &mut RuleContext<'_>) {
        let on = ctx.daytime;
        ctx.set(Relay::GrowLightsAero, on);
        ctx.set(Relay::GrowLightsDwc, on);
    }

    // ── pH dosing ─────────────────────────────────────────────

    fn ph_dosing(&mut self, ctx: &mut RuleContext<'_>, relay: Relay) {
        let sensors = ctx.sensors;
        let f = sensors.filter(SensorKind::Ph);
        if !f.ready() {
            return;
        }
        let ph = f.get();
        let band = self.thresholds.ph;
        let wants_dose = match relay {
            Relay::PhUp => ph < band.low,
            _ => ph > band.high,
        };

        let now = ctx.now;
        let deadline_passed = self.ph_dose_until.is_none_or(|t| now >= t);
        let idle = self.ph_dose_until.is_none_or(|t| now > t);
        let state = ctx.state(relay);

        if state.is_on() && deadline_passed {
            ctx.force(relay, false);
            self.ph_dose_until = Some(now + self.ph_cooldown);
        } else if wants_dose && idle && !state.is_on() {
            ctx.force(relay, true);
            self.ph_dose_until = Some(now + self.ph_dose);
        } else if !state.is_on() && deadline_passed {
            // Settles an unknown valve to OFF; no-op otherwise.
            ctx.set(relay, false);
        }
    }

    // ── Nutrient dosing ───────────────────────────────────────

    fn nutrient_dosing(&mut self, ctx: &mut RuleContext<'_>) {
        let sensors = ctx.sensors;
        let f = sensors.filter(SensorKind::Tds);
        if !f.ready() {
            return;
        }
        let relay = Relay::LeafyGreen;

        if ctx.state(relay) == RelayState::Unknown {
            ctx.force(relay, false);
        }

        let tds = f.get();
        let band = self.thresholds.tds;
        if tds < band.low {
            self.nutrient_active = true;
        } else if tds >= band.high {
            self.nutrient_active = false;
        }

        if !self.nutrient_active {
            if ctx.state(relay).is_on() {
                ctx.force(relay, false);
            }
            return;
        }

        if let Some(on) = self.nutrient.step(ctx.state(relay), ctx.now) {
            ctx.force(relay, on);
        }
    }

    // ── Misting ───────────────────────────────────────────────

    fn misting(&mut self, ctx: &mut RuleContext<'_>) {
        if let Some(on) = self.misting.step(ctx.state(Relay::Misting), ctx.now) {
            ctx.force(Relay::Misting, on);
        }
    }
}
