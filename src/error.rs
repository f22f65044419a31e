//! Error types for Tracelink

use crate::types::TraceRole;
use thiserror::Error;

/// Errors that can occur during trace analysis
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to parse trace document: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{role} trace is empty")]
    EmptyTrace { role: TraceRole },

    #[error("{role} trace packet {index} has invalid timestamp {time}")]
    InvalidTimestamp {
        role: TraceRole,
        index: usize,
        time: f64,
    },

    #[error("{role} trace packet {index} has timestamp {time} earlier than predecessor {prev}")]
    NonMonotonicTime {
        role: TraceRole,
        index: usize,
        prev: f64,
        time: f64,
    },

    #[error("{role} trace packet {index} has zero size")]
    ZeroPacketSize { role: TraceRole, index: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Traffic shape would need {bins} bins, exceeding the {max} bin capacity")]
    ShapeTooLarge { bins: usize, max: usize },

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
