// src/smoother.rs

use crate::types::{PredictionSample, SmoothedState};
use std::collections::VecDeque;

/// Temporal smoother over a bounded sliding window of recent predictions.
///
/// Holds the last W (prediction, confidence) pairs and the last W motion
/// scores; insertion evicts the oldest entry once full. One smoother is
/// owned exclusively by one pipeline run and destroyed with it.
pub struct TemporalSmoother {
    samples: VecDeque<PredictionSample>,
    motion_history: VecDeque<f32>,
    window_size: usize,
    confidence_threshold: f32,
    motion_threshold: f32,
}

impl TemporalSmoother {
    /// Create a new smoother.
    ///
    /// # Arguments
    /// * `window_size` - Number of frames to average over (e.g. 5 frames)
    /// * `confidence_threshold` - Average confidence at or above this marks
    ///   the window reliable
    /// * `motion_threshold` - Average motion above this marks the window as
    ///   having significant motion
    pub fn new(window_size: usize, confidence_threshold: f32, motion_threshold: f32) -> Self {
        Self {
            samples: VecDeque::with_capacity(window_size),
            motion_history: VecDeque::with_capacity(window_size),
            window_size,
            confidence_threshold,
            motion_threshold,
        }
    }

    /// Observe one frame's prediction and motion score, returning the
    /// smoothed view of the current window.
    ///
    /// The reliability and motion flags qualify how much to trust the
    /// window; they are reporting signals, not gates; callers accumulate
    /// every frame's smoothed prediction into run statistics regardless.
    pub fn observe(&mut self, sample: PredictionSample, motion_score: f32) -> SmoothedState {
        self.samples.push_back(sample);
        self.motion_history.push_back(motion_score);

        // Maintain window size
        if self.samples.len() > self.window_size {
            self.samples.pop_front();
            self.motion_history.pop_front();
        }

        let n = self.samples.len() as f32;
        let smoothed_prediction =
            self.samples.iter().map(|s| s.probability).sum::<f32>() / n * 100.0;
        let avg_confidence = self.samples.iter().map(|s| s.confidence).sum::<f32>() / n;
        let avg_motion = self.motion_history.iter().sum::<f32>() / n;

        SmoothedState {
            smoothed_prediction,
            avg_confidence,
            avg_motion,
            is_reliable: avg_confidence >= self.confidence_threshold,
            has_significant_motion: avg_motion > self.motion_threshold,
        }
    }

    /// Number of samples currently held
    pub fn window_len(&self) -> usize {
        self.samples.len()
    }

    /// Oldest-to-newest windowed probabilities, for inspection
    pub fn windowed_probabilities(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.probability).collect()
    }

    /// Reset the smoother (e.g. when the video changes)
    pub fn reset(&mut self) {
        self.samples.clear();
        self.motion_history.clear();
    }
}
