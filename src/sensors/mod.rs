//! Sensor subsystem: the per-quantity filters and the aggregating [`SensorBank`].
//!
//! Raw readings arrive as `name → value` pairs from whatever feeds the
//! controller.  [`Readings`] normalises the names into [`SensorKind`]s;
//! the bank routes each value into its filter and reports rejections.

pub mod feed;
pub mod filter;

use log::{debug, warn};
use serde::Serialize;

use crate::app::events::ControllerEvent;
use crate::app::ports::EventSink;
use filter::{Rejection, SampleOutcome, SensorFilter};

/// Number of monitored quantities.
pub const SENSOR_COUNT: usize = 5;

/// Every quantity the controller monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SensorKind {
    Temperature = 0,
    Humidity = 1,
    Ph = 2,
    DissolvedOxygen = 3,
    Tds = 4,
}

impl SensorKind {
    pub const ALL: [SensorKind; SENSOR_COUNT] = [
        Self::Temperature,
        Self::Humidity,
        Self::Ph,
        Self::DissolvedOxygen,
        Self::Tds,
    ];

    /// Map a feed key to a sensor.  Accepts the canonical keys and the
    /// short names the node firmware prints.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "temperature_c" | "temperature" | "temp" => Some(Self::Temperature),
            "humidity" => Some(Self::Humidity),
            "ph" => Some(Self::Ph),
            "do_mg_l" | "do_mg_per_l" | "do" => Some(Self::DissolvedOxygen),
            "tds_ppm" | "tds" => Some(Self::Tds),
            _ => None,
        }
    }

    /// Canonical feed key.
    pub fn key(self) -> &'static str {
        match self {
            Self::Temperature => "temperature_c",
            Self::Humidity => "humidity",
            Self::Ph => "ph",
            Self::DissolvedOxygen => "do_mg_l",
            Self::Tds => "tds_ppm",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Ph => "pH",
            Self::DissolvedOxygen => "mg/L",
            Self::Tds => "ppm",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One batch of raw readings, at most one value per sensor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Readings {
    values: heapless::Vec<(SensorKind, f32), SENSOR_COUNT>,
    ignored: usize,
}

impl Readings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `name → value` pairs.  Unknown names are counted and dropped.
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, f32)>,
    {
        let mut readings = Self::new();
        for (key, value) in pairs {
            readings.insert_key(key.as_ref(), value);
        }
        readings
    }

    /// Insert by feed key.  Returns `false` for an unknown key.
    pub fn insert_key(&mut self, key: &str, value: f32) -> bool {
        match SensorKind::from_key(key) {
            Some(kind) => {
                self.insert(kind, value);
                true
            }
            None => {
                self.ignored += 1;
                false
            }
        }
    }

    /// Insert or replace the value for `kind`.
    pub fn insert(&mut self, kind: SensorKind, value: f32) {
        if let Some(slot) = self.values.iter_mut().find(|(k, _)| *k == kind) {
            slot.1 = value;
        } else {
            // Capacity equals the number of kinds, so this always fits.
            let _ = self.values.push((kind, value));
        }
    }

    pub fn get(&self, kind: SensorKind) -> Option<f32> {
        self.values.iter().find(|(k, _)| *k == kind).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SensorKind, f32)> + '_ {
        self.values.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys that did not name a known sensor.
    pub fn ignored(&self) -> usize {
        self.ignored
    }
}

/// Owns one filter per [`SensorKind`].
#[derive(Debug, Clone)]
pub struct SensorBank {
    filters: [SensorFilter; SENSOR_COUNT],
}

impl SensorBank {
    pub fn new(window: usize) -> Self {
        Self {
            filters: core::array::from_fn(|_| SensorFilter::new(window)),
        }
    }

    /// Route every value in `readings` into its filter.
    pub fn ingest(&mut self, readings: &Readings, sink: &mut dyn EventSink) {
        for (kind, value) in readings.iter() {
            if let SampleOutcome::Rejected { reason, .. } = self.filters[kind.index()].add(value) {
                match reason {
                    Rejection::NotFinite => warn!("{:?}: rejected non-finite sample", kind),
                    _ => debug!("{:?}: rejected {} ({})", kind, value, reason),
                }
                sink.emit(&ControllerEvent::SampleRejected {
                    sensor: kind,
                    value,
                    reason,
                });
            }
        }
    }

    pub fn filter(&self, kind: SensorKind) -> &SensorFilter {
        &self.filters[kind.index()]
    }

    pub fn filter_mut(&mut self, kind: SensorKind) -> &mut SensorFilter {
        &mut self.filters[kind.index()]
    }

    /// Current mean for `kind`.
    pub fn value(&self, kind: SensorKind) -> f32 {
        self.filter(kind).get()
    }
}
