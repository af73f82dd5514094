//! Inbound operator commands.
//!
//! These come from whatever front end the host wires up (a serial
//! console, an HTTP handler, a dashboard) and are interpreted by
//! [`Controller::handle_command`](super::service::Controller::handle_command).

use crate::drivers::relay::Relay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Enter or leave manual override.  Leaving triggers a resync.
    SetOverride(bool),

    /// Enter or leave calibration suspension.
    SetCalibration(bool),

    /// Switch one relay by hand.  Only accepted while overridden.
    ManualRelay { relay: Relay, on: bool },
}
