//! Traffic shape normalization
//!
//! Converts an event sequence into a fixed-resolution size-over-time
//! histogram. The bin array is sized once up front from the largest event
//! time and validated against a hard capacity, so garbled timestamps cannot
//! trigger unbounded allocation.

use crate::error::AnalysisError;
use crate::types::{Event, Shape};

/// Hard cap on the number of histogram buckets a single shape may allocate.
///
/// At the default 10 ms bin width this covers a trace of roughly 46 hours.
pub const MAX_SHAPE_BINS: usize = 1 << 24;

/// Normalizer for converting event sequences to traffic shapes
pub struct ShapeNormalizer;

impl ShapeNormalizer {
    /// Build the size-over-time histogram for an event sequence.
    ///
    /// Every event adds its size into bucket `floor(time / bin_width_sec)`.
    /// The histogram spans `[0, max_event_time + bin_width_sec)`, i.e.
    /// `floor(max_event_time / bin_width_sec) + 1` buckets. An empty event
    /// sequence yields an empty shape rather than an error.
    pub fn normalize(events: &[Event], bin_width_sec: f64) -> Result<Shape, AnalysisError> {
        if events.is_empty() {
            return Ok(Shape::empty(bin_width_sec));
        }

        let max_time = events.iter().map(|e| e.time).fold(f64::NEG_INFINITY, f64::max);
        let last_slot = (max_time / bin_width_sec).floor();

        if !last_slot.is_finite() || last_slot >= MAX_SHAPE_BINS as f64 {
            let bins = if last_slot.is_finite() && last_slot >= 0.0 {
                (last_slot as usize).saturating_add(1)
            } else {
                usize::MAX
            };
            return Err(AnalysisError::ShapeTooLarge {
                bins,
                max: MAX_SHAPE_BINS,
            });
        }

        let bin_count = last_slot.max(0.0) as usize + 1;
        let mut bins = vec![0.0; bin_count];

        for event in events {
            let index = ((event.time / bin_width_sec).floor() as usize).min(bin_count - 1);
            bins[index] += event.size as f64;
        }

        Ok(Shape {
            bin_width: bin_width_sec,
            bins,
        })
    }
}
