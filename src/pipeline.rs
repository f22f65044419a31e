//! Pipeline orchestration
//!
//! This module provides the public API for Tracelink. It runs the full
//! pipeline from two packet traces to the participation verdict:
//! burst extraction → event correlation + shape correlation → threshold
//! fusion.

use crate::adapter::TraceAdapter;
use crate::config::AnalysisConfig;
use crate::correlator::{EventCorrelator, ShapeCorrelator};
use crate::decision::DecisionEngine;
use crate::encoder::ReportEncoder;
use crate::error::AnalysisError;
use crate::extractor::EventExtractor;
use crate::normalizer::ShapeNormalizer;
use crate::types::{
    validate_trace, CorrelationOutcome, CorrelationScores, MatchReport, Packet, TraceRole,
    TraceSummary,
};

/// Run the full correlation pipeline over two validated traces.
///
/// # Arguments
/// * `user` - Intercepted packet trace of the monitored party
/// * `channel` - Packet trace observed on the target channel
/// * `config` - Tolerances and thresholds for this run
///
/// # Returns
/// Scores from both correlation branches, per-trace summaries, and the
/// verdict.
///
/// The configuration and both traces are validated up front; malformed input
/// surfaces as a distinct [`AnalysisError`] rather than a misleading `false`
/// verdict. The two correlation branches are independent and evaluated
/// sequentially.
pub fn correlate_traces(
    user: &[Packet],
    channel: &[Packet],
    config: &AnalysisConfig,
) -> Result<CorrelationOutcome, AnalysisError> {
    config.validate()?;
    validate_trace(TraceRole::User, user)?;
    validate_trace(TraceRole::Channel, channel)?;

    // Stage 1: collapse both traces into burst events
    let user_events = EventExtractor::extract(user, config.burst_gap_sec);
    let channel_events = EventExtractor::extract(channel, config.burst_gap_sec);

    // Stage 2: event-based correlation
    let event_score = EventCorrelator::correlate(
        &user_events,
        &channel_events,
        config.time_tolerance_sec,
        config.size_tolerance_bytes,
    );

    // Stage 3: shape-based correlation
    let user_shape = ShapeNormalizer::normalize(&user_events, config.bin_width_sec)?;
    let channel_shape = ShapeNormalizer::normalize(&channel_events, config.bin_width_sec)?;
    let shape_score = ShapeCorrelator::correlate(&user_shape, &channel_shape);

    // Stage 4: threshold fusion
    let scores = CorrelationScores {
        event: event_score,
        shape: shape_score,
    };
    let verdict = DecisionEngine::decide(&scores, config.decision_threshold);

    Ok(CorrelationOutcome {
        scores,
        verdict,
        user: TraceSummary {
            packets: user.len(),
            events: user_events.len(),
        },
        channel: TraceSummary {
            packets: channel.len(),
            events: channel_events.len(),
        },
    })
}

/// Correlate two trace documents and return a match report JSON (stateless,
/// one-shot).
///
/// Accepts the same document formats as [`TraceAdapter::parse_document`]:
/// a JSON array of packets (object or `[time, size]` pair form) or NDJSON.
///
/// # Example
/// ```ignore
/// let report = analyze_json(user_json, channel_json, AnalysisConfig::default())?;
/// ```
pub fn analyze_json(
    user_json: &str,
    channel_json: &str,
    config: AnalysisConfig,
) -> Result<String, AnalysisError> {
    let analyzer = TraceAnalyzer::with_config(config);
    let user = TraceAdapter::parse_document(user_json)?;
    let channel = TraceAdapter::parse_document(channel_json)?;
    analyzer.analyze_to_json(&user, &channel)
}

/// Analyzer holding the configuration for repeated runs.
///
/// Each instance carries its own tolerances, so several analyzers with
/// different configurations can operate concurrently. The instance also owns
/// a report encoder whose id ties reports from the same analyzer together.
pub struct TraceAnalyzer {
    config: AnalysisConfig,
    encoder: ReportEncoder,
}

impl Default for TraceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceAnalyzer {
    /// Create an analyzer with the reference thresholds
    pub fn new() -> Self {
        Self::with_config(AnalysisConfig::default())
    }

    /// Create an analyzer with a specific configuration
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self {
            config,
            encoder: ReportEncoder::new(),
        }
    }

    /// The configuration this analyzer runs with
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run the pipeline and return the raw outcome
    pub fn correlate(
        &self,
        user: &[Packet],
        channel: &[Packet],
    ) -> Result<CorrelationOutcome, AnalysisError> {
        correlate_traces(user, channel, &self.config)
    }

    /// Run the pipeline and build a match report
    pub fn analyze(
        &self,
        user: &[Packet],
        channel: &[Packet],
    ) -> Result<MatchReport, AnalysisError> {
        let outcome = self.correlate(user, channel)?;
        Ok(self.encoder.encode(&self.config, &outcome))
    }

    /// Run the pipeline and return the match report as JSON
    pub fn analyze_to_json(
        &self,
        user: &[Packet],
        channel: &[Packet],
    ) -> Result<String, AnalysisError> {
        let outcome = self.correlate(user, channel)?;
        self.encoder.encode_to_json(&self.config, &outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn packets(pairs: &[(f64, u64)]) -> Vec<Packet> {
        pairs.iter().map(|&(t, s)| Packet::new(t, s)).collect()
    }

    #[test]
    fn test_reference_scenario_scores_and_verdict() {
        let user = packets(&[(0.01, 500), (0.02, 400), (0.8, 1500)]);
        let channel = packets(&[(0.015, 500), (0.8, 1500)]);

        let outcome =
            correlate_traces(&user, &channel, &AnalysisConfig::default()).unwrap();

        // User packets collapse to (0.02, 900) and (0.8, 1500); only the
        // 0.8s channel event finds a match within the size tolerance.
        assert_eq!(outcome.user.events, 2);
        assert_eq!(outcome.channel.events, 2);
        assert_eq!(outcome.scores.event, 0.5);

        // Shapes at 10ms bins: user has 900 in bucket 2 and 1500 in bucket
        // 80, channel has 500 in bucket 1 and 1500 in bucket 80. Only the
        // bucket-80 energy overlaps:
        //   2 * 1500 * 1500 / (900² + 1500² + 500² + 1500²)
        assert_eq!(outcome.scores.shape, 4_500_000.0 / 5_560_000.0);

        // Neither 0.5 nor ~0.809 exceeds the 0.9 threshold.
        assert!(!outcome.verdict);
    }

    #[test]
    fn test_identical_traces_give_full_correlation() {
        let trace = packets(&[(0.1, 400), (0.15, 300), (2.0, 1200), (5.5, 800)]);

        let outcome =
            correlate_traces(&trace, &trace, &AnalysisConfig::default()).unwrap();

        assert_eq!(outcome.scores.event, 1.0);
        assert_eq!(outcome.scores.shape, 1.0);
        assert!(outcome.verdict);
    }

    #[test]
    fn test_disjoint_traces_give_zero_correlation() {
        // Events never fall within the tolerances of each other and the
        // shapes share no overlapping buckets.
        let user = packets(&[(0.0, 100), (1.0, 200)]);
        let channel = packets(&[(100.0, 5000), (101.0, 6000)]);

        let outcome =
            correlate_traces(&user, &channel, &AnalysisConfig::default()).unwrap();

        assert_eq!(outcome.scores.event, 0.0);
        assert_eq!(outcome.scores.shape, 0.0);
        assert!(!outcome.verdict);
    }

    #[test]
    fn test_pipeline_is_deterministic() {
        let user = packets(&[(0.01, 500), (0.02, 400), (0.8, 1500), (3.0, 60)]);
        let channel = packets(&[(0.015, 500), (0.8, 1500), (2.9, 55)]);
        let config = AnalysisConfig::default();

        let first = correlate_traces(&user, &channel, &config).unwrap();
        let second = correlate_traces(&user, &channel, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_traces_are_rejected() {
        let trace = packets(&[(0.1, 100)]);
        let config = AnalysisConfig::default();

        assert!(matches!(
            correlate_traces(&[], &trace, &config),
            Err(AnalysisError::EmptyTrace {
                role: TraceRole::User
            })
        ));
        assert!(matches!(
            correlate_traces(&trace, &[], &config),
            Err(AnalysisError::EmptyTrace {
                role: TraceRole::Channel
            })
        ));
    }

    #[test]
    fn test_malformed_traces_are_rejected() {
        let good = packets(&[(0.1, 100)]);
        let backwards = packets(&[(1.0, 100), (0.5, 100)]);
        let config = AnalysisConfig::default();

        assert!(matches!(
            correlate_traces(&backwards, &good, &config),
            Err(AnalysisError::NonMonotonicTime { .. })
        ));

        let zero_size = packets(&[(0.1, 0)]);
        assert!(matches!(
            correlate_traces(&good, &zero_size, &config),
            Err(AnalysisError::ZeroPacketSize { .. })
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let trace = packets(&[(0.1, 100)]);
        let mut config = AnalysisConfig::default();
        config.decision_threshold = 2.0;

        assert!(matches!(
            correlate_traces(&trace, &trace, &config),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_analyzer_reports_scores_and_verdict() {
        let trace = packets(&[(0.1, 400), (2.0, 1200)]);
        let analyzer = TraceAnalyzer::new();

        let report = analyzer.analyze(&trace, &trace).unwrap();
        assert!(report.verdict);
        assert_eq!(report.scores.event, 1.0);
        assert_eq!(report.user.packets, 2);
        assert_eq!(report.config, AnalysisConfig::default());
    }

    #[test]
    fn test_analyze_json_end_to_end() {
        let user = r#"[[0.01, 500], [0.02, 400], [0.8, 1500]]"#;
        let channel = r#"[{"time": 0.015, "size": 500}, {"time": 0.8, "size": 1500}]"#;

        let json = analyze_json(user, channel, AnalysisConfig::default()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["verdict"], false);
        assert_eq!(payload["scores"]["event"], 0.5);
        assert_eq!(payload["user"]["packets"], 3);
        assert_eq!(payload["user"]["events"], 2);
        assert_eq!(payload["producer"]["name"], "tracelink");
    }

    #[test]
    fn test_analyze_json_rejects_garbage() {
        let result = analyze_json("not json", "[]", AnalysisConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_analyzers_with_different_tolerances_disagree() {
        // Same data, looser thresholds flip the verdict.
        let user = packets(&[(0.01, 500), (0.02, 400), (0.8, 1500)]);
        let channel = packets(&[(0.015, 500), (0.8, 1500)]);

        let strict = TraceAnalyzer::new();
        let loose = TraceAnalyzer::with_config(AnalysisConfig {
            size_tolerance_bytes: 500,
            decision_threshold: 0.7,
            ..AnalysisConfig::default()
        });

        assert!(!strict.correlate(&user, &channel).unwrap().verdict);
        assert!(loose.correlate(&user, &channel).unwrap().verdict);
    }
}
