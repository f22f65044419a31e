//! Correlation estimators
//!
//! Two independent similarity estimates between a user trace and a channel
//! trace: event matching under timing/size tolerances, and normalized
//! similarity between the two traffic shapes. Both return values in `[0, 1]`
//! and fall back to `0.0` on degenerate input instead of failing.

use crate::types::{Event, Shape};

/// Greedy event-matching correlator
pub struct EventCorrelator;

impl EventCorrelator {
    /// Fraction of channel events matched to a user event within tolerance.
    ///
    /// For each channel event the user events are scanned in their given
    /// order and the first one with `|Δtime| <= time_tolerance_sec` and
    /// `|Δsize| <= size_tolerance_bytes` is accepted. Matching is greedy, not
    /// nearest-match, and matched user events are not consumed, so one user
    /// event may satisfy several channel events. Match quality therefore
    /// depends on user-event ordering; this mirrors the reference estimator.
    ///
    /// An empty channel sequence scores `0.0` (no evidence of correlation).
    pub fn correlate(
        user: &[Event],
        channel: &[Event],
        time_tolerance_sec: f64,
        size_tolerance_bytes: u64,
    ) -> f64 {
        if channel.is_empty() {
            return 0.0;
        }

        let mut matches = 0usize;
        for channel_event in channel {
            for user_event in user {
                if (channel_event.time - user_event.time).abs() <= time_tolerance_sec
                    && channel_event.size.abs_diff(user_event.size) <= size_tolerance_bytes
                {
                    matches += 1;
                    break;
                }
            }
        }

        matches as f64 / channel.len() as f64
    }
}

/// Shape-similarity correlator
pub struct ShapeCorrelator;

impl ShapeCorrelator {
    /// Normalized dot-product similarity between two traffic shapes.
    ///
    /// Formula: `2 * Σ user[i] * channel[i] / (Σ user[i]² + Σ channel[i]²)`
    /// over `i < min(len)`; trailing buckets of the longer shape are ignored.
    ///
    /// The result is symmetric and lies in `[0, 1]`: `1.0` iff the
    /// overlapping prefixes are identical and non-zero, `0.0` when the shapes
    /// share no overlapping energy (including the zero-length and all-zero
    /// cases, which score `0.0` instead of dividing by zero).
    pub fn correlate(user: &Shape, channel: &Shape) -> f64 {
        let n = user.len().min(channel.len());
        if n == 0 {
            return 0.0;
        }

        let mut dot = 0.0;
        let mut energy = 0.0;
        for i in 0..n {
            dot += user.bins[i] * channel.bins[i];
            energy += user.bins[i] * user.bins[i] + channel.bins[i] * channel.bins[i];
        }

        if energy <= 0.0 {
            return 0.0;
        }

        (2.0 * dot / energy).clamp(0.0, 1.0)
    }
}
