//! Hydroponic enclosure controller.
//!
//! Turns a stream of raw sensor readings (temperature, humidity, pH,
//! dissolved oxygen, TDS) into debounced relay commands for pumps,
//! valves, fans, misters and grow lights.  Everything that touches the
//! outside world goes through the port traits in [`app::ports`].
//!
//! The synchronous [`Controller`] is driven tick by tick by the caller;
//! [`ControllerHandle`] runs it on its own thread.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod sensors;
pub mod worker;

pub use app::service::Controller;
pub use config::ControllerConfig;
pub use error::{Error, Result};
pub use worker::ControllerHandle;
