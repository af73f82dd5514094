//! Relay identities and debounced relay state.
//!
//! The enclosure has nine relay channels.  Each one is wrapped in an
//! [`ActuatorState`] that refuses unforced changes closer together than
//! the debounce interval, so a reading hovering at a threshold cannot
//! chatter the relay.  Pulse rules bypass the debounce with `force`.
//!
//! ## Three-valued state
//!
//! [`RelayState::Unknown`] is neither on nor off.  It is entered when
//! manual override ends: every relay forgets its state so the next rule
//! pass re-asserts each one to the driver.

use core::time::Duration;

use log::{error, info};
use serde::Serialize;

use crate::app::events::ControllerEvent;
use crate::app::ports::{ActuatorPort, EventSink};

/// Number of relay channels.
pub const RELAY_COUNT: usize = 9;

/// Relay channels, numbered as wired on the node (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Relay {
    /// Nutrient (TDS) dosing valve for the leafy-green bed.
    LeafyGreen = 1,
    PhDown = 2,
    PhUp = 3,
    Misting = 4,
    ExhaustOut = 5,
    GrowLightsAero = 6,
    AirPump = 7,
    GrowLightsDwc = 8,
    ExhaustIn = 9,
}

impl Relay {
    pub const ALL: [Relay; RELAY_COUNT] = [
        Self::LeafyGreen,
        Self::PhDown,
        Self::PhUp,
        Self::Misting,
        Self::ExhaustOut,
        Self::GrowLightsAero,
        Self::AirPump,
        Self::GrowLightsDwc,
        Self::ExhaustIn,
    ];

    /// Channel number passed to the actuator driver.
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::LeafyGreen => "LEAFY_GREEN",
            Self::PhDown => "PH_DOWN",
            Self::PhUp => "PH_UP",
            Self::Misting => "MISTING",
            Self::ExhaustOut => "EXHAUST_OUT",
            Self::GrowLightsAero => "GROW_LIGHTS_AERO",
            Self::AirPump => "AIR_PUMP",
            Self::GrowLightsDwc => "GROW_LIGHTS_DWC",
            Self::ExhaustIn => "EXHAUST_IN",
        }
    }

    fn index(self) -> usize {
        self as usize - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayState {
    Off,
    On,
    Unknown,
}

impl RelayState {
    pub fn from_bool(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }

    /// `None` while unknown.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Off => Some(false),
            Self::On => Some(true),
            Self::Unknown => None,
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

/// Debounced state of one relay.
#[derive(Debug, Clone)]
pub struct ActuatorState {
    relay: Relay,
    state: RelayState,
    /// Time of the last accepted change; `None` lets the next change through.
    last_change: Option<Duration>,
    debounce: Duration,
}

impl ActuatorState {
    pub fn new(relay: Relay, debounce: Duration) -> Self {
        Self {
            relay,
            state: RelayState::Off,
            last_change: None,
            debounce,
        }
    }

    pub fn relay(&self) -> Relay {
        self.relay
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn last_change(&self) -> Option<Duration> {
        self.last_change
    }

    /// True once the debounce interval has elapsed since the last change.
    pub fn can_change(&self, now: Duration) -> bool {
        self.last_change
            .is_none_or(|t| now.saturating_sub(t) >= self.debounce)
    }

    /// Request `on`.  Returns `true` if the state was committed.
    ///
    /// Unforced requests are dropped when they match the current state or
    /// arrive inside the debounce window.  An unknown state accepts any
    /// request.
    pub fn set(&mut self, on: bool, force: bool, now: Duration) -> bool {
        let desired = RelayState::from_bool(on);
        if !force {
            if desired == self.state {
                return false;
            }
            if self.state.is_known() && !self.can_change(now) {
                return false;
            }
        }
        self.state = desired;
        self.last_change = Some(now);
        true
    }

    /// Forget the state and the debounce timer.
    pub fn mark_unknown(&mut self) {
        self.state = RelayState::Unknown;
        self.last_change = None;
    }
}

/// All relay states plus the write path to the driver.
#[derive(Debug, Clone)]
pub struct RelayBank {
    relays: [ActuatorState; RELAY_COUNT],
}

impl RelayBank {
    pub fn new(debounce: Duration) -> Self {
        Self {
            relays: Relay::ALL.map(|r| ActuatorState::new(r, debounce)),
        }
    }

    pub fn get(&self, relay: Relay) -> &ActuatorState {
        &self.relays[relay.index()]
    }

    pub fn state(&self, relay: Relay) -> RelayState {
        self.get(relay).state()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActuatorState> {
        self.relays.iter()
    }

    /// Request a relay state; on commit, notify the driver.
    ///
    /// A driver failure is logged and reported but the committed state
    /// stands.  Returns `true` if the state changed.
    pub fn drive(
        &mut self,
        relay: Relay,
        on: bool,
        force: bool,
        now: Duration,
        hw: &mut dyn ActuatorPort,
        sink: &mut dyn EventSink,
    ) -> bool {
        if !self.relays[relay.index()].set(on, force, now) {
            return false;
        }
        info!("{} -> {}", relay.label(), if on { "ON" } else { "OFF" });
        sink.emit(&ControllerEvent::RelayChanged { relay, on, forced: force });
        write_driver(relay, on, hw, sink);
        true
    }

    /// Push every known state to the driver, changed or not.
    /// Returns how many relays were re-asserted.
    pub fn reassert_known(&self, hw: &mut dyn ActuatorPort, sink: &mut dyn EventSink) -> usize {
        let mut count = 0;
        for r in &self.relays {
            if let Some(on) = r.state().as_bool() {
                write_driver(r.relay(), on, hw, sink);
                count += 1;
            }
        }
        count
    }

    pub fn mark_all_unknown(&mut self) {
        for r in &mut self.relays {
            r.mark_unknown();
        }
    }
}

fn write_driver(relay: Relay, on: bool, hw: &mut dyn ActuatorPort, sink: &mut dyn EventSink) {
    if let Err(e) = hw.set_relay(relay, on) {
        error!("driver failed for {}: {:#}", relay.label(), e);
        sink.emit(&ControllerEvent::DriverFailed { relay, on });
    }
}
