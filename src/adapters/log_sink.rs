//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing every controller event through the
//! `log` facade.  The embedding process picks the logger.

use log::{debug, info, warn};

use crate::app::events::ControllerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ControllerEvent`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::RelayChanged { relay, on, forced } => {
                info!(
                    "RELAY | R{} {} -> {}{}",
                    relay.id(),
                    relay.label(),
                    if *on { "ON" } else { "OFF" },
                    if *forced { " (forced)" } else { "" },
                );
            }
            ControllerEvent::Enforced { count } => {
                debug!("ENFORCE | re-asserted {} relay(s)", count);
            }
            ControllerEvent::DriverFailed { relay, on } => {
                warn!(
                    "DRIVER | write failed: {} {}",
                    relay.label(),
                    if *on { "ON" } else { "OFF" },
                );
            }
            ControllerEvent::SampleRejected {
                sensor,
                value,
                reason,
            } => {
                debug!("FILTER | {} rejected {} ({})", sensor.key(), value, reason);
            }
            ControllerEvent::ModeChanged { from, to } => {
                info!("MODE | {:?} -> {:?}", from, to);
            }
            ControllerEvent::Resynced => {
                info!("MODE | override released, relays resynced");
            }
            ControllerEvent::ManualSet { relay, on } => {
                info!(
                    "MANUAL | {} -> {}",
                    relay.label(),
                    if *on { "ON" } else { "OFF" },
                );
            }
            ControllerEvent::SamplesDropped => {
                warn!("INGEST | sample batch dropped");
            }
        }
    }
}
