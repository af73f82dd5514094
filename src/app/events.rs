//! Outbound controller events.
//!
//! The [`Controller`](super::service::Controller) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them, usually logging.

use crate::drivers::relay::Relay;
use crate::fsm::Mode;
use crate::sensors::SensorKind;
use crate::sensors::filter::Rejection;

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// A relay state was committed and sent to the driver.
    RelayChanged { relay: Relay, on: bool, forced: bool },

    /// Periodic re-assertion pushed `count` known states to the driver.
    Enforced { count: usize },

    /// The driver reported an error for this write.
    DriverFailed { relay: Relay, on: bool },

    /// A sensor sample was discarded by its filter.
    SampleRejected {
        sensor: SensorKind,
        value: f32,
        reason: Rejection,
    },

    /// The controller moved between modes.
    ModeChanged { from: Mode, to: Mode },

    /// Override ended; every relay was reset to unknown and re-evaluated.
    Resynced,

    /// A relay was switched by hand while overridden.
    ManualSet { relay: Relay, on: bool },

    /// Ingestion outran the control loop and a batch was dropped.
    SamplesDropped,
}
