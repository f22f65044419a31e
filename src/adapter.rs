//! Trace document parsing
//!
//! Parses packet traces from JSON documents. Two layouts are accepted, one
//! packet per element: object form `{"time": 0.015, "size": 500}` and the
//! compact pair form `[0.015, 500]`, in either a JSON array or NDJSON (one
//! packet per line).

use crate::error::AnalysisError;
use crate::types::Packet;
use serde::Deserialize;

/// Wire representation of a packet (object or pair form)
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PacketRepr {
    Object { time: f64, size: u64 },
    Pair(f64, u64),
}

impl From<PacketRepr> for Packet {
    fn from(repr: PacketRepr) -> Self {
        match repr {
            PacketRepr::Object { time, size } => Packet { time, size },
            PacketRepr::Pair(time, size) => Packet { time, size },
        }
    }
}

/// Adapter for reading packet traces from JSON documents
pub struct TraceAdapter;

impl TraceAdapter {
    /// Parse a trace document, trying a JSON array first and falling back to
    /// NDJSON.
    pub fn parse_document(input: &str) -> Result<Vec<Packet>, AnalysisError> {
        match Self::parse_array(input) {
            Ok(packets) => Ok(packets),
            Err(_) => Self::parse_ndjson(input),
        }
    }

    /// Parse a JSON array of packets
    pub fn parse_array(input: &str) -> Result<Vec<Packet>, AnalysisError> {
        let reprs: Vec<PacketRepr> = serde_json::from_str(input)
            .map_err(|e| AnalysisError::ParseError(format!("Invalid packet array: {}", e)))?;
        Ok(reprs.into_iter().map(Packet::from).collect())
    }

    /// Parse NDJSON input (one packet per line, blank lines skipped)
    pub fn parse_ndjson(input: &str) -> Result<Vec<Packet>, AnalysisError> {
        let mut packets = Vec::new();

        for (line_number, line) in input.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let repr: PacketRepr = serde_json::from_str(trimmed).map_err(|e| {
                AnalysisError::ParseError(format!(
                    "Invalid packet on line {}: {}",
                    line_number + 1,
                    e
                ))
            })?;
            packets.push(repr.into());
        }

        Ok(packets)
    }

    /// Collect every contract violation in a parsed trace.
    ///
    /// Unlike [`crate::types::validate_trace`], which stops at the first
    /// violation, this walks the whole trace so a validation report can show
    /// all offending packets at once.
    pub fn validate_packets(packets: &[Packet]) -> Vec<PacketIssue> {
        let mut issues = Vec::new();
        let mut prev_valid_time: Option<f64> = None;

        for (index, packet) in packets.iter().enumerate() {
            if !packet.time.is_finite() || packet.time < 0.0 {
                issues.push(PacketIssue {
                    index,
                    message: format!("invalid timestamp {}", packet.time),
                });
            } else {
                if let Some(prev) = prev_valid_time {
                    if packet.time < prev {
                        issues.push(PacketIssue {
                            index,
                            message: format!(
                                "timestamp {} earlier than predecessor {}",
                                packet.time, prev
                            ),
                        });
                    }
                }
                prev_valid_time = Some(packet.time);
            }

            if packet.size == 0 {
                issues.push(PacketIssue {
                    index,
                    message: "zero packet size".to_string(),
                });
            }
        }

        issues
    }
}

/// One contract violation found in a trace
#[derive(Debug, Clone, serde::Serialize)]
pub struct PacketIssue {
    /// Index of the offending packet in the trace
    pub index: usize,
    /// Human-readable description of the violation
    pub message: String,
}
