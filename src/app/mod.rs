//! Controller core.
//!
//! The [`service::Controller`] owns the filters, relay states, rule timers
//! and mode flags.  It touches the outside world only through the
//! **port traits** in [`ports`], so the whole control loop is testable
//! with in-memory drivers and a hand-driven clock.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod status;
