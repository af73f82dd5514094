//! Controller mode state machine.
//!
//! ```text
//!               override=1                      calibration=1
//!   ┌─────────┐ ─────────▶ ┌────────────┐       ┌──────────────────────┐
//!   │ Running │            │ Overridden │       │ CalibrationSuspended │
//!   └─────────┘ ◀───────── └────────────┘       └──────────────────────┘
//!        ▲       override=0 (resync)                      │
//!        └────────────────────────────────────────────────┘
//!                        calibration=0
//! ```
//!
//! The mode is derived from two independent operator flags.  Calibration
//! wins when both are set: it forbids every relay write, manual ones
//! included.  Each setter reports the edge it produced so the controller
//! can run exactly one action per transition.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    /// Rules evaluated every tick.
    Running,
    /// Rules skipped; manual relay requests accepted.
    Overridden,
    /// Rules skipped; no relay writes at all.
    CalibrationSuspended,
}

impl Mode {
    /// True when the rule engine runs.
    pub fn is_automatic(self) -> bool {
        self == Self::Running
    }

    /// True when relay writes may reach the driver.
    pub fn allows_writes(self) -> bool {
        self != Self::CalibrationSuspended
    }
}

/// Edge produced by a flag change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeEdge {
    OverrideEntered,
    OverrideExited,
    CalibrationEntered,
    CalibrationExited,
}

/// The two operator flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModeFlags {
    pub override_mode: bool,
    pub calibration_mode: bool,
}

impl ModeFlags {
    pub fn mode(&self) -> Mode {
        if self.calibration_mode {
            Mode::CalibrationSuspended
        } else if self.override_mode {
            Mode::Overridden
        } else {
            Mode::Running
        }
    }

    /// Set the override flag.  `None` if it already had that value.
    pub fn set_override(&mut self, on: bool) -> Option<ModeEdge> {
        if self.override_mode == on {
            return None;
        }
        self.override_mode = on;
        Some(if on { ModeEdge::OverrideEntered } else { ModeEdge::OverrideExited })
    }

    /// Set the calibration flag.  `None` if it already had that value.
    pub fn set_calibration(&mut self, on: bool) -> Option<ModeEdge> {
        if self.calibration_mode == on {
            return None;
        }
        self.calibration_mode = on;
        Some(if on {
            ModeEdge::CalibrationEntered
        } else {
            ModeEdge::CalibrationExited
        })
    }
}
