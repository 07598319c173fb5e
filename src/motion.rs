// src/motion.rs

use crate::types::{MotionMetrics, NormalizedFrame};

/// Per-pixel difference magnitude above this counts toward the motion
/// area. 30 on the 0-255 scale, recomputed for [0,1] pixel space.
pub const DIFF_THRESHOLD: f32 = 30.0 / 255.0;

/// Measure pixel-level change between two consecutive normalized frames.
///
/// With no prior frame the zero triple is returned, the defined boundary
/// condition for the first frame of any sequence, not an error. Otherwise
/// the per-pixel absolute difference is reduced to a single-channel luma
/// magnitude, from which three scalars are derived:
///
/// - `score`: mean magnitude
/// - `variance`: variance of the magnitude
/// - `area_fraction`: fraction of pixels whose magnitude exceeds
///   [`DIFF_THRESHOLD`]
///
/// No raw difference image is retained.
pub fn measure(previous: Option<&NormalizedFrame>, current: &NormalizedFrame) -> MotionMetrics {
    let Some(previous) = previous else {
        return MotionMetrics::ZERO;
    };

    debug_assert_eq!(previous.data.len(), current.data.len());

    let pixels = current.pixel_count();
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut moving = 0usize;

    for i in 0..pixels {
        let dr = (current.data[i * 3] - previous.data[i * 3]).abs();
        let dg = (current.data[i * 3 + 1] - previous.data[i * 3 + 1]).abs();
        let db = (current.data[i * 3 + 2] - previous.data[i * 3 + 2]).abs();

        let magnitude = 0.299 * dr + 0.587 * dg + 0.114 * db;

        sum += magnitude as f64;
        sum_sq += (magnitude as f64) * (magnitude as f64);
        if magnitude > DIFF_THRESHOLD {
            moving += 1;
        }
    }

    let n = pixels as f64;
    let mean = sum / n;
    let variance = (sum_sq / n - mean * mean).max(0.0);

    MotionMetrics {
        score: mean as f32,
        variance: variance as f32,
        area_fraction: moving as f32 / pixels as f32,
    }
}
