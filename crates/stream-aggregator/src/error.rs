//! Error types for the aggregation engine
//!
//! Every failure is reported synchronously to the caller. An aggregator that
//! has never seen a value is not an error: reads return `None` instead.

use thiserror::Error;

/// Main aggregation engine error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregatorError {
    /// An aggregator with this name is already registered
    #[error("duplicate aggregator name: '{name}' is already registered")]
    DuplicateName { name: String },

    /// Operation not allowed in the registry's current lifecycle state
    #[error("illegal state: cannot {operation} while registry is {state}")]
    IllegalState { operation: String, state: String },

    /// Snapshot operation or value domain disagrees with the target aggregator
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// No aggregator registered under this name
    #[error("unknown aggregator: '{name}'")]
    UnknownAggregator { name: String },

    /// Invalid configuration
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    /// Snapshot encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AggregatorError {
    pub(crate) fn illegal_state(operation: &str, state: impl std::fmt::Display) -> Self {
        AggregatorError::IllegalState {
            operation: operation.to_string(),
            state: state.to_string(),
        }
    }

    pub(crate) fn configuration(reason: impl Into<String>) -> Self {
        AggregatorError::Configuration {
            reason: reason.into(),
        }
    }
}

/// Result type alias for aggregation engine operations
pub type Result<T> = std::result::Result<T, AggregatorError>;

impl From<serde_json::Error> for AggregatorError {
    fn from(err: serde_json::Error) -> Self {
        AggregatorError::Serialization(err.to_string())
    }
}

impl From<figment::Error> for AggregatorError {
    fn from(err: figment::Error) -> Self {
        AggregatorError::Configuration {
            reason: err.to_string(),
        }
    }
}
