//! Match report encoding
//!
//! Builds the JSON report for one analysis run: producer metadata, the
//! configuration the run used, per-trace summaries, scores, and the verdict.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::types::{CorrelationOutcome, MatchReport, ReportProducer};
use crate::{PRODUCER_NAME, TRACELINK_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Encoder for producing match report payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Build a match report from a pipeline outcome
    pub fn encode(&self, config: &AnalysisConfig, outcome: &CorrelationOutcome) -> MatchReport {
        MatchReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: TRACELINK_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            config: *config,
            user: outcome.user,
            channel: outcome.channel,
            scores: outcome.scores,
            verdict: outcome.verdict,
        }
    }

    /// Encode to a JSON string
    pub fn encode_to_json(
        &self,
        config: &AnalysisConfig,
        outcome: &CorrelationOutcome,
    ) -> Result<String, AnalysisError> {
        let report = self.encode(config, outcome);
        serde_json::to_string_pretty(&report).map_err(AnalysisError::JsonError)
    }
}
