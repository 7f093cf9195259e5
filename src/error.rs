//! Error kinds reported by the trigger core and its collaborators.

use thiserror::Error;

/// Everything the monitor can report upward.
///
/// Only `DeviceUnavailable` is fatal, and only when starting. The other kinds
/// are surfaced as warnings while the polling loop keeps running.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PttError {
    #[error("audio input device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("malformed frame: expected {expected} samples, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error("{field} out of range: {value} clamped to {clamped}")]
    ConfigOutOfRange {
        field: &'static str,
        value: i64,
        clamped: i64,
    },

    #[error("key actuator failed: {0}")]
    Actuator(String),

    #[error("audio stream closed")]
    StreamClosed,
}

impl PttError {
    /// Short machine-readable label used in JSON status output.
    pub fn label(&self) -> &'static str {
        match self {
            PttError::DeviceUnavailable(_) => "device_unavailable",
            PttError::MalformedFrame { .. } => "malformed_frame",
            PttError::ConfigOutOfRange { .. } => "config_out_of_range",
            PttError::Actuator(_) => "actuator",
            PttError::StreamClosed => "stream_closed",
        }
    }
}

pub type PttResult<T> = Result<T, PttError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_values() {
        let err = PttError::MalformedFrame {
            expected: 1024,
            actual: 512,
        };
        assert_eq!(
            err.to_string(),
            "malformed frame: expected 1024 samples, got 512"
        );

        let err = PttError::ConfigOutOfRange {
            field: "release_delay_ms",
            value: 5000,
            clamped: 2000,
        };
        assert_eq!(
            err.to_string(),
            "release_delay_ms out of range: 5000 clamped to 2000"
        );
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(PttError::StreamClosed.label(), "stream_closed");
        assert_eq!(
            PttError::DeviceUnavailable("x".into()).label(),
            "device_unavailable"
        );
    }
}
