//! Core types for the Tracelink pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw packets, burst events, traffic shapes, and correlation output.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Which side of the analysis a trace belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceRole {
    User,
    Channel,
}

impl TraceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceRole::User => "user",
            TraceRole::Channel => "channel",
        }
    }
}

impl std::fmt::Display for TraceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single packet observation: arrival time and size on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Arrival time in seconds from the capture origin
    pub time: f64,
    /// Packet size in bytes
    pub size: u64,
}

impl Packet {
    pub fn new(time: f64, size: u64) -> Self {
        Self { time, size }
    }
}

/// An aggregated burst of packets treated as one observation unit.
///
/// Produced by the event extractor: the time is the last packet of the burst,
/// the size is the sum of all packet sizes in the burst.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Time of the last packet in the burst (seconds)
    pub time: f64,
    /// Total size of the burst (bytes)
    pub size: u64,
}

/// Time-bucketed histogram of event sizes at a fixed bin width.
///
/// Bucket `i` covers `[i * bin_width, (i + 1) * bin_width)` and holds the sum
/// of sizes of all events whose time falls inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// Bucket width in seconds
    pub bin_width: f64,
    /// Bucket sums, one per time slot from the origin
    pub bins: Vec<f64>,
}

impl Shape {
    /// Shape with no buckets (empty event sequence)
    pub fn empty(bin_width: f64) -> Self {
        Self {
            bin_width,
            bins: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Similarity estimates produced by the two correlation branches.
///
/// Both values lie in `[0, 1]`. They are similarity scores, not probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrelationScores {
    /// Fraction of channel events matched to a user event within tolerance
    pub event: f64,
    /// Normalized similarity between the two traffic shapes
    pub shape: f64,
}

/// Packet and event counts for one side of the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub packets: usize,
    pub events: usize,
}

/// Full result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationOutcome {
    /// Scores from the two correlation branches
    pub scores: CorrelationScores,
    /// Final participation verdict
    pub verdict: bool,
    /// User-side input summary
    pub user: TraceSummary,
    /// Channel-side input summary
    pub channel: TraceSummary,
}

/// Producer metadata embedded in match reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Encoded analysis report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    /// Report schema version
    pub report_version: String,
    /// Producer metadata
    pub producer: ReportProducer,
    /// When the report was computed (RFC3339)
    pub computed_at_utc: String,
    /// Configuration the analysis ran with
    pub config: crate::config::AnalysisConfig,
    /// User-side input summary
    pub user: TraceSummary,
    /// Channel-side input summary
    pub channel: TraceSummary,
    /// Correlation scores
    pub scores: CorrelationScores,
    /// Final participation verdict
    pub verdict: bool,
}

/// Validate the input contract for one trace.
///
/// Rejects empty traces, non-finite or negative timestamps, timestamps that
/// go backwards, and zero-size packets. Called by the pipeline before any
/// arithmetic so malformed captures surface as a distinct failure instead of
/// a misleading verdict.
pub fn validate_trace(role: TraceRole, packets: &[Packet]) -> Result<(), AnalysisError> {
    if packets.is_empty() {
        return Err(AnalysisError::EmptyTrace { role });
    }

    let mut prev_time: Option<f64> = None;
    for (index, packet) in packets.iter().enumerate() {
        if !packet.time.is_finite() || packet.time < 0.0 {
            return Err(AnalysisError::InvalidTimestamp {
                role,
                index,
                time: packet.time,
            });
        }

        if packet.size == 0 {
            return Err(AnalysisError::ZeroPacketSize { role, index });
        }

        if let Some(prev) = prev_time {
            if packet.time < prev {
                return Err(AnalysisError::NonMonotonicTime {
                    role,
                    index,
                    prev,
                    time: packet.time,
                });
            }
        }
        prev_time = Some(packet.time);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_packet_serialization() {
        let packet = Packet::new(0.015, 500);
        let json = serde_json::to_string(&packet).unwrap();
        assert_eq!(json, r#"{"time":0.015,"size":500}"#);

        let parsed: Packet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn test_trace_role_display() {
        assert_eq!(TraceRole::User.to_string(), "user");
        assert_eq!(TraceRole::Channel.to_string(), "channel");
    }

    #[test]
    fn test_validate_trace_accepts_well_formed_input() {
        let trace = vec![
            Packet::new(0.0, 100),
            Packet::new(0.5, 200),
            Packet::new(0.5, 300), // equal timestamps are allowed
            Packet::new(1.2, 50),
        ];
        assert!(validate_trace(TraceRole::User, &trace).is_ok());
    }

    #[test]
    fn test_validate_trace_rejects_empty() {
        let result = validate_trace(TraceRole::Channel, &[]);
        assert!(matches!(
            result,
            Err(AnalysisError::EmptyTrace {
                role: TraceRole::Channel
            })
        ));
    }

    #[test]
    fn test_validate_trace_rejects_backwards_time() {
        let trace = vec![Packet::new(1.0, 100), Packet::new(0.5, 100)];
        let result = validate_trace(TraceRole::User, &trace);
        assert!(matches!(
            result,
            Err(AnalysisError::NonMonotonicTime { index: 1, .. })
        ));
    }

    #[test]
    fn test_validate_trace_rejects_negative_and_non_finite_time() {
        let negative = vec![Packet::new(-0.1, 100)];
        assert!(matches!(
            validate_trace(TraceRole::User, &negative),
            Err(AnalysisError::InvalidTimestamp { index: 0, .. })
        ));

        let nan = vec![Packet::new(f64::NAN, 100)];
        assert!(matches!(
            validate_trace(TraceRole::User, &nan),
            Err(AnalysisError::InvalidTimestamp { index: 0, .. })
        ));
    }

    #[test]
    fn test_validate_trace_rejects_zero_size() {
        let trace = vec![Packet::new(0.0, 100), Packet::new(0.1, 0)];
        assert!(matches!(
            validate_trace(TraceRole::Channel, &trace),
            Err(AnalysisError::ZeroPacketSize { index: 1, .. })
        ));
    }

    #[test]
    fn test_shape_empty() {
        let shape = Shape::empty(0.01);
        assert!(shape.is_empty());
        assert_eq!(shape.len(), 0);
        assert_eq!(shape.bin_width, 0.01);
    }
}
