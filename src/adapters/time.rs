//! Host clock adapter.
//!
//! Monotonic time comes from [`std::time::Instant`], measured from the
//! moment the clock was built.  The hour of day comes from the local wall
//! clock via `chrono`, so the grow-light schedule follows the host's
//! timezone and DST changes.

use std::time::{Duration, Instant};

use chrono::{Local, Timelike};

use crate::app::ports::ClockPort;

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl ClockPort for SystemClock {
    fn monotonic(&self) -> Duration {
        self.start.elapsed()
    }

    fn local_hour(&self) -> u8 {
        // `hour()` is always 0-23.
        Local::now().hour() as u8
    }
}
