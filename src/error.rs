//! Unified error types for the automation controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! caller-facing surface uniform.  Invalid sensor samples and not-ready
//! rules are deliberately absent: those are handled inside the
//! controller and never surface as errors.

use core::fmt;

use crate::drivers::relay::Relay;
use crate::fsm::Mode;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
    /// A sensor feed line could not be decoded.
    Feed(FeedError),
    /// A manual relay request arrived while automation owns the relays.
    ManualControl { relay: Relay, mode: Mode },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Feed(e) => write!(f, "feed: {e}"),
            Self::ManualControl { relay, mode } => {
                write!(f, "manual control of {} rejected in mode {:?}", relay.label(), mode)
            }
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A field failed range validation.  The message names the field.
    ValidationFailed(&'static str),
    /// The document is not valid JSON for `ControllerConfig`.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Feed errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FeedError {
    /// The line is not a JSON object.
    InvalidJson(String),
    /// The object carries no `readings` map.
    MissingReadings,
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson(msg) => write!(f, "invalid JSON: {msg}"),
            Self::MissingReadings => write!(f, "no readings object"),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<FeedError> for Error {
    fn from(e: FeedError) -> Self {
        Self::Feed(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
