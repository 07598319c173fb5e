// src/confidence.rs
//
// Fuses classifier certainty with motion corroboration. A classifier that
// is confident AND sees corroborating motion is trusted more than a
// confident classifier in a static scene, which suppresses false positives
// from spurious single-frame misclassification.

use crate::types::{ClassProbs, MotionMetrics};

const BASE_WEIGHT: f32 = 0.4;
const MOTION_WEIGHT: f32 = 0.2;
const VARIANCE_WEIGHT: f32 = 0.2;
const AREA_WEIGHT: f32 = 0.2;

/// Combine a classifier probability pair and a motion triple into a single
/// confidence value in [0,1].
///
/// The base term is the classifier's decisiveness: max of the two class
/// probabilities, not merely the accident probability. Motion components
/// are normalized with fixed linear caps before weighting.
pub fn score(probs: &ClassProbs, motion: &MotionMetrics) -> f32 {
    let base = probs.decisiveness();
    let m = motion.normalized();

    let confidence = base
        * (BASE_WEIGHT
            + MOTION_WEIGHT * m.score
            + VARIANCE_WEIGHT * m.variance
            + AREA_WEIGHT * m.area_fraction);

    confidence.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_scene_discounts_confidence() {
        let probs = ClassProbs {
            no_accident: 0.1,
            accident: 0.9,
        };
        let confidence = score(&probs, &MotionMetrics::ZERO);

        // Zero motion leaves only the base weight
        assert!((confidence - 0.9 * 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_saturated_motion_restores_full_decisiveness() {
        let probs = ClassProbs {
            no_accident: 0.05,
            accident: 0.95,
        };
        let motion = MotionMetrics {
            score: 0.5,
            variance: 0.5,
            area_fraction: 0.5,
        };
        // All three factors cap at 1.0, so the weights sum to 1.0
        let confidence = score(&probs, &motion);
        assert!((confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_decisiveness_uses_winning_class() {
        // A confident no-accident frame is just as decisive as a
        // confident accident frame
        let no_accident = ClassProbs {
            no_accident: 0.9,
            accident: 0.1,
        };
        let accident = ClassProbs {
            no_accident: 0.1,
            accident: 0.9,
        };
        let motion = MotionMetrics {
            score: 0.2,
            variance: 0.01,
            area_fraction: 0.1,
        };

        assert_eq!(score(&no_accident, &motion), score(&accident, &motion));
    }

    #[test]
    fn test_output_stays_in_unit_interval() {
        for p in [0.0f32, 0.25, 0.5, 0.75, 1.0] {
            for m in [0.0f32, 0.1, 0.5, 1.0, 10.0] {
                let probs = ClassProbs {
                    no_accident: 1.0 - p,
                    accident: p,
                };
                let motion = MotionMetrics {
                    score: m,
                    variance: m,
                    area_fraction: m.min(1.0),
                };
                let confidence = score(&probs, &motion);
                assert!(
                    (0.0..=1.0).contains(&confidence),
                    "confidence {confidence} out of range for p={p} m={m}"
                );
            }
        }
    }
}
