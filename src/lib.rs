//! Tracelink - On-device correlation engine for linking packet traces
//!
//! Tracelink decides whether a monitored party's observed traffic matches
//! traffic seen on a separate, known communication channel, using only packet
//! metadata (arrival time, size) through a deterministic pipeline:
//! burst extraction → event correlation + shape correlation → threshold
//! fusion into a boolean participation verdict.
//!
//! The engine performs no capture and no I/O; it consumes two pre-extracted
//! packet traces and a set of tolerances, and every stage is pure.

pub mod adapter;
pub mod config;
pub mod correlator;
pub mod decision;
pub mod encoder;
pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod pipeline;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::AnalysisConfig;
pub use error::AnalysisError;
pub use pipeline::{analyze_json, correlate_traces, TraceAnalyzer};

// Data model exports
pub use types::{
    CorrelationOutcome, CorrelationScores, Event, MatchReport, Packet, Shape, TraceRole,
};

/// Tracelink version embedded in all match reports
pub const TRACELINK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for match reports
pub const PRODUCER_NAME: &str = "tracelink";
