//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements | Connects to                 |
//! |------------|------------|-----------------------------|
//! | `log_sink` | EventSink  | `log` facade                |
//! | `time`     | ClockPort  | `Instant` + local wall clock |
//!
//! Relay drivers live in [`crate::drivers`].

pub mod log_sink;
pub mod time;
