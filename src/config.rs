//! Controller configuration parameters
//!
//! All tunable thresholds and timings for the automation controller.
//! The defaults match the reference grow enclosure; a JSON document can
//! override any subset of them at startup.  The configuration is fixed
//! for the lifetime of a controller.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sensors::filter::{DEFAULT_WINDOW, MAX_WINDOW};

/// A low/high hysteresis band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f32,
    pub high: f32,
}

impl Band {
    pub const fn new(low: f32, high: f32) -> Self {
        Self { low, high }
    }

    fn is_ordered(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low < self.high
    }
}

/// Hysteresis bands for every rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Dissolved oxygen (mg/L): air pump ON below `low`, OFF at or above `high`.
    pub dissolved_oxygen: Band,
    /// Daytime temperature (°C): exhaust ON above `high`, OFF at or below `low`.
    pub temp_day: Band,
    /// Nighttime temperature (°C).
    pub temp_night: Band,
    /// Relative humidity (%).  Only `high` drives the exhaust.
    pub humidity: Band,
    /// pH: dose up below `low`, dose down above `high`.
    pub ph: Band,
    /// Total dissolved solids (ppm): start dosing below `low`, stop at `high`.
    pub tds: Band,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            dissolved_oxygen: Band::new(7.0, 8.5),
            temp_day: Band::new(23.0, 26.0),
            temp_night: Band::new(19.0, 22.0),
            humidity: Band::new(60.0, 70.0),
            ph: Band::new(5.5, 7.0),
            tds: Band::new(675.0, 800.0),
        }
    }
}

/// Loop cadence, debounce and pulse timings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Control loop period (milliseconds).
    pub tick_interval_ms: u64,
    /// Periodic re-assertion of all known relay states (seconds).
    pub enforce_interval_secs: u64,
    /// Minimum dwell between unforced relay changes (seconds).
    pub debounce_secs: u64,
    /// pH valve ON time per dose (seconds).
    pub ph_dose_secs: u64,
    /// Wait after a pH dose before the next dose decision (seconds).
    pub ph_cooldown_secs: u64,
    /// Nutrient valve ON time per pulse (seconds).
    pub nutrient_on_secs: u64,
    /// Nutrient valve OFF time between pulses (seconds).
    pub nutrient_off_secs: u64,
    /// Misting pump ON time (seconds).
    pub misting_on_secs: u64,
    /// Misting pump OFF time (seconds).
    pub misting_off_secs: u64,
    /// First daytime hour (inclusive, 0-23).
    pub day_start_hour: u8,
    /// First nighttime hour (exclusive end of day, 0-23).
    pub day_end_hour: u8,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000, // 1 Hz
            enforce_interval_secs: 10,
            debounce_secs: 5,
            ph_dose_secs: 2,
            ph_cooldown_secs: 30,
            nutrient_on_secs: 2,
            nutrient_off_secs: 30,
            misting_on_secs: 5,
            misting_off_secs: 15 * 60,
            day_start_hour: 6,
            day_end_hour: 18,
        }
    }
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn enforce_interval(&self) -> Duration {
        Duration::from_secs(self.enforce_interval_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    /// True if `hour` falls in `[day_start_hour, day_end_hour)`.
    pub fn is_daytime(&self, hour: u8) -> bool {
        hour >= self.day_start_hour && hour < self.day_end_hour
    }
}

/// Complete controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub thresholds: Thresholds,
    pub timing: TimingConfig,
    /// Moving-average window, in samples, for every sensor filter.
    pub filter_window: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            timing: TimingConfig::default(),
            filter_window: DEFAULT_WINDOW,
        }
    }
}

impl ControllerConfig {
    /// Reject values that would make the controller oscillate or stall.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        let bands = [
            (t.dissolved_oxygen, "thresholds.dissolved_oxygen: low must be below high"),
            (t.temp_day, "thresholds.temp_day: low must be below high"),
            (t.temp_night, "thresholds.temp_night: low must be below high"),
            (t.humidity, "thresholds.humidity: low must be below high"),
            (t.ph, "thresholds.ph: low must be below high"),
            (t.tds, "thresholds.tds: low must be below high"),
        ];
        for (band, msg) in bands {
            if !band.is_ordered() {
                return Err(ConfigError::ValidationFailed(msg));
            }
        }

        let tm = &self.timing;
        if tm.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed("timing.tick_interval_ms must be > 0"));
        }
        if tm.enforce_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("timing.enforce_interval_secs must be > 0"));
        }
        if tm.debounce_secs == 0 {
            return Err(ConfigError::ValidationFailed("timing.debounce_secs must be > 0"));
        }
        let pulses = [
            tm.ph_dose_secs,
            tm.ph_cooldown_secs,
            tm.nutrient_on_secs,
            tm.nutrient_off_secs,
            tm.misting_on_secs,
            tm.misting_off_secs,
        ];
        if pulses.contains(&0) {
            return Err(ConfigError::ValidationFailed("timing: pulse durations must be > 0"));
        }
        if tm.day_start_hour > 23 || tm.day_end_hour > 23 {
            return Err(ConfigError::ValidationFailed("timing: hours must be 0-23"));
        }
        if tm.day_start_hour >= tm.day_end_hour {
            return Err(ConfigError::ValidationFailed(
                "timing.day_start_hour must be before day_end_hour",
            ));
        }

        if self.filter_window < 2 || self.filter_window > MAX_WINDOW {
            return Err(ConfigError::ValidationFailed("filter_window must be 2..=64"));
        }
        Ok(())
    }

    /// Parse a JSON document and validate it.  Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("loading config {}", path.display()))?;
        Ok(config)
    }
}
