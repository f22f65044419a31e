//! Threshold fusion
//!
//! Fuses the two correlation scores into the final participation verdict.

use crate::types::CorrelationScores;

/// OR-threshold decision engine
pub struct DecisionEngine;

impl DecisionEngine {
    /// `true` iff either correlation score strictly exceeds the threshold.
    pub fn decide(scores: &CorrelationScores, decision_threshold: f64) -> bool {
        scores.event > decision_threshold || scores.shape > decision_threshold
    }
}
