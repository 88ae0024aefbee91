//! Errors reported by the engine's command interface.
//!
//! Nothing here ever crosses into the render context: every check runs on
//! the calling thread, before any shared state is touched.

use std::fmt;

use thiserror::Error;

use crate::engine::State;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    // == Configuration ==
    #[error("invalid {what}: {value} Hz")]
    InvalidFrequency { what: &'static str, value: f64 },

    #[error("minimum frequency {min} Hz is above maximum frequency {max} Hz")]
    InvalidFrequencyRange { min: f64, max: f64 },

    #[error("minimum frequency must be above zero for {mode} sweeps (got {min} Hz)")]
    NonPositiveMinimum { mode: &'static str, min: f64 },

    #[error("invalid {what}: {value}")]
    InvalidAmplitude { what: &'static str, value: f64 },

    #[error("sweep rate must be a positive number of cycles per second (got {0})")]
    InvalidSweepRate(f64),

    #[error("channel count must be at least 1 (got {0})")]
    InvalidChannels(i64),

    #[error("sample rate must be positive (got {0})")]
    InvalidSampleRate(i64),

    #[error("unknown sweep mode id {0}")]
    UnknownSweepMode(i64),

    #[error("unknown sweep mode `{0}`")]
    UnknownSweepModeName(String),

    // == Lifecycle ==
    #[error("cannot {operation} while {state}")]
    InvalidTransition {
        operation: &'static str,
        state: State,
    },
}

/// Broad classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A rejected parameter value.
    Configuration,
    /// A command issued from a state that does not allow it.
    InvalidState,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidTransition { .. } => ErrorKind::InvalidState,
            _ => ErrorKind::Configuration,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration error"),
            ErrorKind::InvalidState => write!(f, "invalid state transition"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_kind() {
        let err = EngineError::InvalidChannels(0);
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = EngineError::InvalidTransition {
            operation: "start audio",
            state: State::Uninitialized,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.to_string(), "cannot start audio while uninitialized");
    }
}
