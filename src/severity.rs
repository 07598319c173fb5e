// src/severity.rs

use crate::types::{MotionMetrics, SeverityLevel, SeverityVerdict};
use serde::{Deserialize, Serialize};

const PREDICTION_WEIGHT: f32 = 0.6;
const MOTION_WEIGHT: f32 = 0.2;
const VARIANCE_WEIGHT: f32 = 0.1;
const AREA_WEIGHT: f32 = 0.1;

/// How a numeric severity score maps onto a discrete tier.
///
/// Two policies exist as configuration options of one mapping, not two
/// designs: the default weighs the fused severity score against inclusive
/// cutoffs, while `confidence_keyed` reproduces the confirmation-gate
/// policy that keys on the gate's mean accident probability (percent).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TierPolicy {
    /// score >= high -> High, score >= medium -> Medium, else Low
    ScoreWeighted { medium: f32, high: f32 },
    /// value <= low_max -> Low, value <= medium_max -> Medium, else High
    ConfidenceKeyed { low_max: f32, medium_max: f32 },
}

impl Default for TierPolicy {
    fn default() -> Self {
        TierPolicy::ScoreWeighted {
            medium: 50.0,
            high: 80.0,
        }
    }
}

impl TierPolicy {
    /// Map a value in [0,100] to a tier. Monotonic: a strictly higher
    /// value never yields a lower tier.
    pub fn tier(&self, value: f32) -> SeverityLevel {
        match *self {
            TierPolicy::ScoreWeighted { medium, high } => {
                if value >= high {
                    SeverityLevel::High
                } else if value >= medium {
                    SeverityLevel::Medium
                } else {
                    SeverityLevel::Low
                }
            }
            TierPolicy::ConfidenceKeyed { low_max, medium_max } => {
                if value <= low_max {
                    SeverityLevel::Low
                } else if value <= medium_max {
                    SeverityLevel::Medium
                } else {
                    SeverityLevel::High
                }
            }
        }
    }
}

/// Maps a smoothed prediction plus motion signal to a severity verdict.
pub struct SeverityClassifier {
    policy: TierPolicy,
}

impl SeverityClassifier {
    pub fn new(policy: TierPolicy) -> Self {
        Self { policy }
    }

    /// Classify a run's aggregate signal.
    ///
    /// `prediction` is a fraction in [0,1], not a percentage. The motion
    /// triple is normalized with the same linear caps the confidence
    /// scorer applies, which bounds the weighted sum by 100; the clamp is
    /// kept anyway. `gate_accuracy` is the confirmation gate's mean
    /// accident probability in percent, consulted only by the
    /// confidence-keyed policy.
    pub fn classify(
        &self,
        prediction: f32,
        motion: &MotionMetrics,
        gate_accuracy: Option<f32>,
    ) -> SeverityVerdict {
        let m = motion.normalized();
        let score = ((prediction * PREDICTION_WEIGHT
            + m.score * MOTION_WEIGHT
            + m.variance * VARIANCE_WEIGHT
            + m.area_fraction * AREA_WEIGHT)
            * 100.0)
            .clamp(0.0, 100.0);

        let level = match self.policy {
            TierPolicy::ScoreWeighted { .. } => self.policy.tier(score),
            TierPolicy::ConfidenceKeyed { .. } => self.policy.tier(gate_accuracy.unwrap_or(score)),
        };

        SeverityVerdict { level, score }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_weighted_tier_boundaries() {
        // Inclusive lower bound of the higher tier
        let policy = TierPolicy::default();
        assert_eq!(policy.tier(79.999), SeverityLevel::Medium);
        assert_eq!(policy.tier(80.0), SeverityLevel::High);
        assert_eq!(policy.tier(49.999), SeverityLevel::Low);
        assert_eq!(policy.tier(50.0), SeverityLevel::Medium);
    }

    #[test]
    fn test_confidence_keyed_tier_boundaries() {
        let policy = TierPolicy::ConfidenceKeyed {
            low_max: 70.0,
            medium_max: 85.0,
        };
        assert_eq!(policy.tier(70.0), SeverityLevel::Low);
        assert_eq!(policy.tier(70.001), SeverityLevel::Medium);
        assert_eq!(policy.tier(85.0), SeverityLevel::Medium);
        assert_eq!(policy.tier(85.001), SeverityLevel::High);
    }

    #[test]
    fn test_tier_mapping_is_monotonic() {
        let policies = [
            TierPolicy::default(),
            TierPolicy::ConfidenceKeyed {
                low_max: 70.0,
                medium_max: 85.0,
            },
        ];
        for policy in policies {
            let mut previous = SeverityLevel::Low;
            for step in 0..=1000 {
                let level = policy.tier(step as f32 / 10.0);
                assert!(
                    level >= previous,
                    "tier regressed at value {}",
                    step as f32 / 10.0
                );
                previous = level;
            }
        }
    }

    #[test]
    fn test_decisive_prediction_with_strong_motion_is_high() {
        let classifier = SeverityClassifier::new(TierPolicy::default());
        let motion = MotionMetrics {
            score: 0.5,
            variance: 0.5,
            area_fraction: 0.5,
        };
        // All motion factors cap at 1.0: score = (0.57 + 0.2 + 0.1 + 0.1) * 100
        let verdict = classifier.classify(0.95, &motion, None);

        assert!((verdict.score - 97.0).abs() < 1e-3);
        assert_eq!(verdict.level, SeverityLevel::High);
    }

    #[test]
    fn test_static_scene_pulls_score_down() {
        let classifier = SeverityClassifier::new(TierPolicy::default());
        let verdict = classifier.classify(0.95, &MotionMetrics::ZERO, None);

        assert!((verdict.score - 57.0).abs() < 1e-3);
        assert_eq!(verdict.level, SeverityLevel::Medium);
    }

    #[test]
    fn test_score_never_exceeds_bounds() {
        let classifier = SeverityClassifier::new(TierPolicy::default());
        let motion = MotionMetrics {
            score: 50.0,
            variance: 50.0,
            area_fraction: 1.0,
        };
        let verdict = classifier.classify(1.0, &motion, None);
        assert!(verdict.score <= 100.0);

        let verdict = classifier.classify(0.0, &MotionMetrics::ZERO, None);
        assert!(verdict.score >= 0.0);
    }

    #[test]
    fn test_confidence_keyed_uses_gate_accuracy() {
        let classifier = SeverityClassifier::new(TierPolicy::ConfidenceKeyed {
            low_max: 70.0,
            medium_max: 85.0,
        });
        let verdict = classifier.classify(0.95, &MotionMetrics::ZERO, Some(92.0));
        assert_eq!(verdict.level, SeverityLevel::High);

        let verdict = classifier.classify(0.95, &MotionMetrics::ZERO, Some(65.0));
        assert_eq!(verdict.level, SeverityLevel::Low);
    }
}
