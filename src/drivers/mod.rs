//! Relay state tracking and actuator drivers.

pub mod relay;
pub mod serial_relay;
