//! Analysis configuration
//!
//! All pipeline tunables live in an explicit [`AnalysisConfig`] passed into
//! each run, so multiple analyses with different tolerances can execute
//! concurrently. Defaults carry the reference thresholds.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Default inter-packet gap (seconds) that separates two bursts
pub const DEFAULT_BURST_GAP_SEC: f64 = 0.5;

/// Default shape histogram bucket width (seconds)
pub const DEFAULT_BIN_WIDTH_SEC: f64 = 0.01;

/// Default timing tolerance (seconds) for event matching
pub const DEFAULT_TIME_TOLERANCE_SEC: f64 = 3.0;

/// Default size tolerance (bytes) for event matching
pub const DEFAULT_SIZE_TOLERANCE_BYTES: u64 = 10;

/// Default correlation score a branch must strictly exceed to declare
/// participation
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.9;

/// Tunables for one analysis run.
///
/// Serde defaults allow partial documents: `{}` deserializes to
/// `AnalysisConfig::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Inter-packet gap (seconds) at or above which a packet starts a new
    /// burst. Larger values merge more packets into one event.
    #[serde(default = "default_burst_gap")]
    pub burst_gap_sec: f64,

    /// Bucket width (seconds) of the traffic shape histogram
    #[serde(default = "default_bin_width")]
    pub bin_width_sec: f64,

    /// Maximum time difference (seconds) accepted as an event match
    #[serde(default = "default_time_tolerance")]
    pub time_tolerance_sec: f64,

    /// Maximum size difference (bytes) accepted as an event match
    #[serde(default = "default_size_tolerance")]
    pub size_tolerance_bytes: u64,

    /// Minimum correlation score (either branch, strict) to declare
    /// participation
    #[serde(default = "default_decision_threshold")]
    pub decision_threshold: f64,
}

fn default_burst_gap() -> f64 {
    DEFAULT_BURST_GAP_SEC
}

fn default_bin_width() -> f64 {
    DEFAULT_BIN_WIDTH_SEC
}

fn default_time_tolerance() -> f64 {
    DEFAULT_TIME_TOLERANCE_SEC
}

fn default_size_tolerance() -> u64 {
    DEFAULT_SIZE_TOLERANCE_BYTES
}

fn default_decision_threshold() -> f64 {
    DEFAULT_DECISION_THRESHOLD
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            burst_gap_sec: DEFAULT_BURST_GAP_SEC,
            bin_width_sec: DEFAULT_BIN_WIDTH_SEC,
            time_tolerance_sec: DEFAULT_TIME_TOLERANCE_SEC,
            size_tolerance_bytes: DEFAULT_SIZE_TOLERANCE_BYTES,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    /// Check the configuration invariants.
    ///
    /// Burst gap and bin width must be finite and positive, the timing
    /// tolerance finite and non-negative, and the decision threshold inside
    /// `[0, 1]`.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.burst_gap_sec.is_finite() || self.burst_gap_sec <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "burst_gap_sec must be finite and positive, got {}",
                self.burst_gap_sec
            )));
        }

        if !self.bin_width_sec.is_finite() || self.bin_width_sec <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "bin_width_sec must be finite and positive, got {}",
                self.bin_width_sec
            )));
        }

        if !self.time_tolerance_sec.is_finite() || self.time_tolerance_sec < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "time_tolerance_sec must be finite and non-negative, got {}",
                self.time_tolerance_sec
            )));
        }

        if !self.decision_threshold.is_finite()
            || !(0.0..=1.0).contains(&self.decision_threshold)
        {
            return Err(AnalysisError::InvalidConfig(format!(
                "decision_threshold must lie in [0, 1], got {}",
                self.decision_threshold
            )));
        }

        Ok(())
    }
}
