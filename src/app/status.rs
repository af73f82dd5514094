//! Status snapshot returned by [`Controller::status`](super::service::Controller::status).
//!
//! Everything here is plain data and serializes to JSON for dashboards.

use serde::Serialize;

use crate::config::Thresholds;
use crate::drivers::relay::{RELAY_COUNT, Relay, RelayState};
use crate::fsm::Mode;
use crate::sensors::filter::SensorFilter;
use crate::sensors::{SENSOR_COUNT, SensorKind};

/// Current filtered mean of every sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilteredValues {
    pub temperature: f32,
    pub humidity: f32,
    pub ph: f32,
    pub dissolved_oxygen: f32,
    pub tds: f32,
}

impl FilteredValues {
    pub fn get(&self, kind: SensorKind) -> f32 {
        match kind {
            SensorKind::Temperature => self.temperature,
            SensorKind::Humidity => self.humidity,
            SensorKind::Ph => self.ph,
            SensorKind::DissolvedOxygen => self.dissolved_oxygen,
            SensorKind::Tds => self.tds,
        }
    }
}

/// Per-filter diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterStatus {
    pub sensor: SensorKind,
    pub mean: f32,
    pub samples: usize,
    pub ready: bool,
    pub fast_ready: bool,
    pub rejected: u32,
}

impl FilterStatus {
    pub fn new(sensor: SensorKind, filter: &SensorFilter) -> Self {
        Self {
            sensor,
            mean: filter.get(),
            samples: filter.len(),
            ready: filter.ready(),
            fast_ready: filter.fast_ready(),
            rejected: filter.rejected_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelayStatus {
    pub id: u8,
    pub label: &'static str,
    pub state: RelayState,
}

impl RelayStatus {
    pub fn new(relay: Relay, state: RelayState) -> Self {
        Self {
            id: relay.id(),
            label: relay.label(),
            state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerStatus {
    pub mode: Mode,
    pub override_mode: bool,
    pub calibration_mode: bool,
    pub is_daytime: bool,
    pub filtered_values: FilteredValues,
    pub filters: [FilterStatus; SENSOR_COUNT],
    pub relay_states: [RelayStatus; RELAY_COUNT],
    pub thresholds: Thresholds,
    pub nutrient_dosing_active: bool,
    pub tick_count: u64,
}

impl ControllerStatus {
    /// State of `relay` in this snapshot.
    pub fn relay(&self, relay: Relay) -> RelayState {
        self.relay_states
            .iter()
            .find(|r| r.id == relay.id())
            .map_or(RelayState::Unknown, |r| r.state)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
