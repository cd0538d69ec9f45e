//! Composite quality scoring
//!
//! Maps a [`QualityMetrics`] set to an integer score in `0..=100` and a
//! four-tier rating. The arithmetic does not depend on how the image was
//! produced.

use crate::quality::QualityMetrics;
use serde::{Deserialize, Serialize};

/// (cap, points) per sub-score: the metric is scaled linearly up to `cap`
const SHARPNESS_BAND: (f64, f64) = (200.0, 30.0);
const CONTRAST_BAND: (f64, f64) = (80.0, 25.0);
const SNR_BAND: (f64, f64) = (20.0, 25.0);
const EDGE_DENSITY_BAND: (f64, f64) = (0.2, 20.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityRating {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl QualityRating {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 80 => QualityRating::Excellent,
            s if s >= 60 => QualityRating::Good,
            s if s >= 40 => QualityRating::Fair,
            _ => QualityRating::Poor,
        }
    }
}

impl std::fmt::Display for QualityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityRating::Excellent => write!(f, "Excellent"),
            QualityRating::Good => write!(f, "Good"),
            QualityRating::Fair => write!(f, "Fair"),
            QualityRating::Poor => write!(f, "Poor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Composite score (0 - 100)
    pub value: u8,
    pub rating: QualityRating,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct QualityScorer;

impl QualityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, metrics: &QualityMetrics) -> QualityScore {
        let total = sub_score(metrics.sharpness, SHARPNESS_BAND)
            + sub_score(metrics.contrast, CONTRAST_BAND)
            + sub_score(metrics.snr, SNR_BAND)
            + sub_score(metrics.edge_density, EDGE_DENSITY_BAND);

        let value = total.round().clamp(0.0, 100.0) as u8;
        QualityScore { value, rating: QualityRating::from_score(value) }
    }
}

/// Convenience wrapper around [`QualityScorer::score`]
pub fn score(metrics: &QualityMetrics) -> QualityScore {
    QualityScorer::new().score(metrics)
}

fn sub_score(value: f64, (cap, points): (f64, f64)) -> f64 {
    if !value.is_finite() {
        // +inf saturates, NaN and -inf contribute nothing
        return if value == f64::INFINITY { points } else { 0.0 };
    }
    (value / cap).clamp(0.0, 1.0) * points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(sharpness: f64, contrast: f64, snr: f64, edge_density: f64) -> QualityMetrics {
        QualityMetrics { sharpness, brightness: 128.0, contrast, snr, edge_density }
    }

    #[test]
    fn test_saturated_metrics_score_full_marks() {
        let s = score(&metrics(1e6, 500.0, 90.0, 0.9));
        assert_eq!(s.value, 100);
        assert_eq!(s.rating, QualityRating::Excellent);
    }

    #[test]
    fn test_zero_metrics_score_zero() {
        let s = score(&QualityMetrics::default());
        assert_eq!(s.value, 0);
        assert_eq!(s.rating, QualityRating::Poor);
    }

    #[test]
    fn test_linear_scaling_and_rounding() {
        // 15 + 12.5 + 12.5 + 10 = 50
        assert_eq!(score(&metrics(100.0, 40.0, 10.0, 0.1)).value, 50);
        // 30*0.51 = 15.3 rounds down
        assert_eq!(score(&metrics(102.0, 0.0, 0.0, 0.0)).value, 15);
        // 25*0.1 + 25*0.1 = 5.0, then +0.6 from sharpness 4
        assert_eq!(score(&metrics(4.0, 8.0, 2.0, 0.0)).value, 6);
    }

    #[test]
    fn test_rating_thresholds() {
        assert_eq!(QualityRating::from_score(100), QualityRating::Excellent);
        assert_eq!(QualityRating::from_score(80), QualityRating::Excellent);
        assert_eq!(QualityRating::from_score(79), QualityRating::Good);
        assert_eq!(QualityRating::from_score(60), QualityRating::Good);
        assert_eq!(QualityRating::from_score(59), QualityRating::Fair);
        assert_eq!(QualityRating::from_score(40), QualityRating::Fair);
        assert_eq!(QualityRating::from_score(39), QualityRating::Poor);
        assert_eq!(QualityRating::from_score(0), QualityRating::Poor);
    }

    #[test]
    fn test_score_monotonic_in_each_metric() {
        let base = metrics(50.0, 20.0, 5.0, 0.05);
        let steps = [0.0, 0.5, 1.0, 2.0, 5.0, 10.0, 100.0];
        let mut last = [0u8; 4];
        for (i, &k) in steps.iter().enumerate() {
            let variants = [
                metrics(base.sharpness * k, base.contrast, base.snr, base.edge_density),
                metrics(base.sharpness, base.contrast * k, base.snr, base.edge_density),
                metrics(base.sharpness, base.contrast, base.snr * k, base.edge_density),
                metrics(base.sharpness, base.contrast, base.snr, base.edge_density * k),
            ];
            for (j, m) in variants.iter().enumerate() {
                let value = score(m).value;
                if i > 0 {
                    assert!(value >= last[j], "metric {} decreased at step {}", j, k);
                }
                last[j] = value;
            }
        }
    }

    #[test]
    fn test_non_finite_metrics_stay_in_range() {
        let s = score(&metrics(f64::NAN, f64::INFINITY, -5.0, 0.0));
        assert_eq!(s.value, 25);
    }

    #[test]
    fn test_rating_display() {
        assert_eq!(QualityRating::Good.to_string(), "Good");
        assert_eq!(QualityRating::Poor.to_string(), "Poor");
    }
}
