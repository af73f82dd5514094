//! Line-protocol relay driver.
//!
//! The relay node on the other end of a serial link (or a pipe, or a TCP
//! socket) accepts one command per line:
//!
//! ```text
//! R7 ON
//! R7 OFF
//! ```

use core::fmt::Write as _;
use std::io;

use anyhow::Context;

use crate::app::ports::ActuatorPort;
use crate::drivers::relay::Relay;

/// Longest command: `R9 OFF\n`.
const LINE_CAP: usize = 16;

/// Writes relay commands to any [`io::Write`].
#[derive(Debug)]
pub struct SerialRelayDriver<W: io::Write> {
    out: W,
}

impl<W: io::Write> SerialRelayDriver<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Format one command line.
pub fn command_line(relay: Relay, on: bool) -> heapless::String<LINE_CAP> {
    let mut line = heapless::String::new();
    // Cannot overflow: two digits at most plus a three-letter state.
    let _ = writeln!(line, "R{} {}", relay.id(), if on { "ON" } else { "OFF" });
    line
}

impl<W: io::Write> ActuatorPort for SerialRelayDriver<W> {
    fn set_relay(&mut self, relay: Relay, on: bool) -> anyhow::Result<()> {
        let line = command_line(relay, on);
        self.out
            .write_all(line.as_bytes())
            .and_then(|()| self.out.flush())
            .with_context(|| format!("writing {:?}", line.trim_end()))
    }
}
