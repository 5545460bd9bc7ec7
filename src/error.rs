//! Error types for maestro-io

use crate::transport::TransportError;
use std::time::Duration;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// maestro-io error types
///
/// Range violations are always reported before any byte is written, so an
/// `OutOfRange` never leaves the controller in a changed state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Command attempted while the connection is closed (or already dropped)
    #[error("{operation}: not connected, call open() first")]
    NotConnected {
        /// Operation that was refused
        operation: &'static str,
    },

    /// Argument outside its documented domain
    #[error("{quantity} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        /// What was being validated (e.g. "position", "speed", "channel")
        quantity: &'static str,
        /// Offending value
        value: i64,
        /// Smallest accepted value
        min: i64,
        /// Largest accepted value
        max: i64,
    },

    /// Underlying open/write/read failed
    #[error("{operation}{}: transport failure: {source}", channel_suffix(.channel))]
    TransportFailure {
        /// Operation during which the transport failed
        operation: &'static str,
        /// Wire channel the command addressed, if any
        channel: Option<u8>,
        /// Underlying transport error
        #[source]
        source: TransportError,
    },

    /// Received byte count differs from the command's declared response length
    #[error(
        "{operation}{}: malformed response, expected {expected} bytes, got {actual}",
        channel_suffix(.channel)
    )]
    MalformedResponse {
        /// Operation that expected the response
        operation: &'static str,
        /// Wire channel the command addressed, if any
        channel: Option<u8>,
        /// Declared response length
        expected: usize,
        /// Bytes actually received
        actual: usize,
    },

    /// Calibration values violate `neutral > delta` or exceed the wire range
    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    /// Polling did not observe the expected state in time
    #[error("{operation}: timed out after {waited:?}")]
    Timeout {
        /// Operation that was polling
        operation: &'static str,
        /// Time spent before giving up
        waited: Duration,
    },

    /// Configuration file could not be parsed
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration could not be serialized
    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

fn channel_suffix(channel: &Option<u8>) -> String {
    match channel {
        Some(ch) => format!(" (channel {})", ch),
        None => String::new(),
    }
}

impl Error {
    /// Build an `OutOfRange` error from any integer-like values
    pub(crate) fn out_of_range(
        quantity: &'static str,
        value: impl Into<i64>,
        min: impl Into<i64>,
        max: impl Into<i64>,
    ) -> Self {
        Error::OutOfRange {
            quantity,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        }
    }
}
