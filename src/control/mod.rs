//! Control rules and the timers they use.

pub mod pulse;
pub mod rules;
