//! Sensor node line decoder.
//!
//! The grow-bed node prints one JSON object per line on its serial port:
//!
//! ```text
//! {"device":"esp32-1","ts":"2026-01-08T12:34:56Z","readings":{"temp":24.12,"humidity":55.1,"tds":640.0}}
//! ```
//!
//! [`parse_line`] turns such a line into [`Readings`] ready for
//! `update_sensors`.  Non-numeric values are skipped; unknown keys are
//! counted in [`Readings::ignored`].

use serde_json::Value;

use super::Readings;
use crate::error::FeedError;

/// One decoded node message.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedFrame {
    /// Reporting device, if the node named itself.
    pub device: Option<String>,
    pub readings: Readings,
}

/// Decode one line of node output.
pub fn parse_line(line: &str) -> Result<FeedFrame, FeedError> {
    let value: Value =
        serde_json::from_str(line.trim()).map_err(|e| FeedError::InvalidJson(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(FeedError::InvalidJson("expected an object".into()));
    };

    let device = obj
        .get("device")
        .or_else(|| obj.get("id"))
        .and_then(Value::as_str)
        .map(str::to_owned);

    let Some(Value::Object(map)) = obj.get("readings") else {
        return Err(FeedError::MissingReadings);
    };

    let mut readings = Readings::new();
    for (key, raw) in map {
        // Numbers only; nulls and strings from a failed probe are skipped.
        if let Some(v) = raw.as_f64() {
            readings.insert_key(key, v as f32);
        }
    }

    Ok(FeedFrame { device, readings })
}
