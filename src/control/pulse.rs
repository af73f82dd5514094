//! Fixed duty-cycle pulse timer for misting and nutrient dosing.
//!
//! The timer remembers when the relay last went on and off.  It does not
//! own the relay state: each step is handed the current state and
//! answers with the forced transition to apply, if any.  An unknown
//! state is answered with OFF and the timestamps are left alone, so a
//! cycle interrupted by manual override resumes where it stopped.

use core::time::Duration;

use crate::drivers::relay::RelayState;

#[derive(Debug, Clone)]
pub struct PulseCycle {
    on_for: Duration,
    off_for: Duration,
    last_on: Option<Duration>,
    last_off: Option<Duration>,
}

impl PulseCycle {
    pub fn new(on_for: Duration, off_for: Duration) -> Self {
        Self {
            on_for,
            off_for,
            last_on: None,
            last_off: None,
        }
    }

    /// Decide the next transition.  `Some(on)` must be applied forced.
    pub fn step(&mut self, state: RelayState, now: Duration) -> Option<bool> {
        match state {
            RelayState::Unknown => Some(false),
            RelayState::On => {
                if elapsed(self.last_on, self.on_for, now) {
                    self.last_off = Some(now);
                    Some(false)
                } else {
                    None
                }
            }
            RelayState::Off => {
                if elapsed(self.last_off, self.off_for, now) {
                    self.last_on = Some(now);
                    Some(true)
                } else {
                    None
                }
            }
        }
    }

    pub fn last_on(&self) -> Option<Duration> {
        self.last_on
    }

    pub fn last_off(&self) -> Option<Duration> {
        self.last_off
    }
}

fn elapsed(since: Option<Duration>, period: Duration, now: Duration) -> bool {
    since.is_none_or(|t| now.saturating_sub(t) >= period)
}
