//! Port traits: the boundary between controller logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! The controller never touches hardware or the system clock directly.
//! Drivers, clocks and event sinks implement these traits and are passed
//! in at call sites, so the whole controller runs against mocks in tests.

use core::time::Duration;

use crate::drivers::relay::Relay;

// ───────────────────────────────────────────────────────────────
// Actuator port (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the controller calls this to switch a relay.
///
/// Implementations should not block.  A returned error is logged by the
/// controller; the relay state it committed is kept regardless.
pub trait ActuatorPort {
    fn set_relay(&mut self, relay: Relay, on: bool) -> anyhow::Result<()>;
}

/// Any `FnMut(actuator_id, on)` closure is a driver.
impl<F> ActuatorPort for F
where
    F: FnMut(u8, bool) -> anyhow::Result<()>,
{
    fn set_relay(&mut self, relay: Relay, on: bool) -> anyhow::Result<()> {
        self(relay.id(), on)
    }
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Time source for debounce, pulse timers and the daytime schedule.
pub trait ClockPort {
    /// Monotonic time since an arbitrary fixed origin.
    fn monotonic(&self) -> Duration;

    /// Local hour of day, 0-23.
    fn local_hour(&self) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The controller emits structured [`ControllerEvent`](super::events::ControllerEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ControllerEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &super::events::ControllerEvent) {}
}
