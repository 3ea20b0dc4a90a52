//! Emotion classifier boundary.
//!
//! A classifier may fail on low-confidence or undetectable input;
//! callers treat that as "no result this frame" and move on. The
//! synthetic implementation draws estimates from a random process so
//! demos, seeding, and tests have data without a model.

use crate::detect::FaceRegion;
use crate::frame::Frame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::collections::BTreeMap;
use thiserror::Error;

// --- Named constants (no magic numbers) ---
/// Labels the synthetic process draws from.
pub const EMOTION_LABELS: [&str; 5] = ["happy", "sad", "neutral", "angry", "surprise"];
/// Happy skews brighter than the rest.
const HAPPY_MEAN: f64 = 70.0;
const BASE_MEAN: f64 = 50.0;
const SCORE_SD: f64 = 15.0;
/// Non-dominant labels score at most this fraction of the dominant one.
const SUBDOMINANT_CEILING: f64 = 0.9;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("region {x},{y} {width}x{height} exceeds frame bounds {frame_width}x{frame_height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("region is empty")]
    EmptyRegion,
}

/// Dominant emotion plus the full per-label confidence map.
/// Confidences are on the 0-100 scale.
#[derive(Debug, Clone)]
pub struct EmotionEstimate {
    /// Lower-case dominant label.
    pub label: String,
    /// Confidence of the dominant label.
    pub confidence: f64,
    pub scores: BTreeMap<String, f64>,
}

/// Strategy for estimating the emotion within a face region.
pub trait EmotionClassifier {
    fn analyze(
        &mut self,
        frame: &Frame,
        region: &FaceRegion,
    ) -> Result<EmotionEstimate, ClassifyError>;
}

/// Random-process classifier: uniform dominant label, normally
/// distributed intensity (happy mean 70, others 50, sd 15, clamped to
/// 0-100).
pub struct SyntheticClassifier {
    rng: StdRng,
}

impl SyntheticClassifier {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic variant for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SyntheticClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionClassifier for SyntheticClassifier {
    fn analyze(
        &mut self,
        frame: &Frame,
        region: &FaceRegion,
    ) -> Result<EmotionEstimate, ClassifyError> {
        if region.width == 0 || region.height == 0 {
            return Err(ClassifyError::EmptyRegion);
        }
        let fits_x = region.x as u64 + region.width as u64 <= frame.width as u64;
        let fits_y = region.y as u64 + region.height as u64 <= frame.height as u64;
        if !fits_x || !fits_y {
            return Err(ClassifyError::RegionOutOfBounds {
                x: region.x,
                y: region.y,
                width: region.width,
                height: region.height,
                frame_width: frame.width,
                frame_height: frame.height,
            });
        }
        Ok(sample_estimate(&mut self.rng))
    }
}

/// Draw one synthetic estimate. Shared with the journal-seeding path,
/// which needs the same distribution without a frame in hand.
pub fn sample_estimate(rng: &mut impl Rng) -> EmotionEstimate {
    let dominant = EMOTION_LABELS[rng.gen_range(0..EMOTION_LABELS.len())];
    let confidence = sample_score(rng, mean_for(dominant));

    let mut scores = BTreeMap::new();
    for &label in &EMOTION_LABELS {
        let score = if label == dominant {
            confidence
        } else {
            rng.gen::<f64>() * confidence * SUBDOMINANT_CEILING
        };
        scores.insert(label.to_string(), score);
    }

    EmotionEstimate {
        label: dominant.to_string(),
        confidence,
        scores,
    }
}

fn mean_for(label: &str) -> f64 {
    if label == "happy" {
        HAPPY_MEAN
    } else {
        BASE_MEAN
    }
}

/// Normal draw clamped to the 0-100 scale.
fn sample_score(rng: &mut impl Rng, mean: f64) -> f64 {
    // Construction fails only for a non-finite or negative sd.
    let score = Normal::new(mean, SCORE_SD)
        .map(|normal| normal.sample(rng))
        .unwrap_or(mean);
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame(width: u32, height: u32) -> Frame {
        Frame {
            data: vec![0u8; (width * height) as usize],
            width,
            height,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        }
    }

    #[test]
    fn test_estimate_shape() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let estimate = sample_estimate(&mut rng);
            assert!(EMOTION_LABELS.contains(&estimate.label.as_str()));
            assert!((0.0..=100.0).contains(&estimate.confidence));
            assert_eq!(estimate.scores.len(), EMOTION_LABELS.len());
            assert_eq!(estimate.scores[&estimate.label], estimate.confidence);
            assert!(estimate
                .scores
                .values()
                .all(|&score| score <= estimate.confidence));
        }
    }

    #[test]
    fn test_scores_stay_on_percent_scale() {
        let mut rng = StdRng::seed_from_u64(3);
        let scores: Vec<f64> = (0..1000).map(|_| sample_score(&mut rng, BASE_MEAN)).collect();
        for score in &scores {
            assert!((0.0..=100.0).contains(score), "out of range: {score}");
        }
        let spread = scores.iter().any(|score| (score - BASE_MEAN).abs() > 1.0);
        assert!(spread, "scores should vary around the mean");
    }

    #[test]
    fn test_happy_skews_brighter() {
        let mut rng = StdRng::seed_from_u64(5);
        let happy: f64 = (0..1000).map(|_| sample_score(&mut rng, HAPPY_MEAN)).sum::<f64>() / 1000.0;
        let base: f64 = (0..1000).map(|_| sample_score(&mut rng, BASE_MEAN)).sum::<f64>() / 1000.0;
        assert!(
            happy > base + 10.0,
            "expected happy mean well above base: {happy:.1} vs {base:.1}"
        );
    }

    #[test]
    fn test_analyze_valid_region() {
        let frame = test_frame(200, 200);
        let region = FaceRegion { x: 20, y: 20, width: 100, height: 100 };
        let estimate = SyntheticClassifier::seeded(1).analyze(&frame, &region).unwrap();
        assert!(EMOTION_LABELS.contains(&estimate.label.as_str()));
    }

    #[test]
    fn test_analyze_region_out_of_bounds() {
        let frame = test_frame(100, 100);
        let region = FaceRegion { x: 60, y: 10, width: 60, height: 60 };
        let err = SyntheticClassifier::seeded(1).analyze(&frame, &region).unwrap_err();
        assert!(matches!(err, ClassifyError::RegionOutOfBounds { .. }));
    }

    #[test]
    fn test_analyze_empty_region() {
        let frame = test_frame(100, 100);
        let region = FaceRegion { x: 10, y: 10, width: 0, height: 20 };
        let err = SyntheticClassifier::seeded(1).analyze(&frame, &region).unwrap_err();
        assert!(matches!(err, ClassifyError::EmptyRegion));
    }
}
