//! Quality report for a fusion run
//!
//! Scores every source image and the fused composite, and records how the
//! composite compares with its inputs.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image_fusion::{FusionMethod, FusionResult, Image, QualityAnalyzer, QualityMetrics, QualityRating, QualityScorer};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

// Below these the fused image gets a recommendation
const LOW_SHARPNESS: f64 = 100.0;
const LOW_CONTRAST: f64 = 40.0;
const LOW_SNR: f64 = 10.0;
const LOW_EDGE_DENSITY: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAssessment {
    pub name: String,
    pub metrics: QualityMetrics,
    /// Composite score (0 - 100)
    pub score: u8,
    pub rating: QualityRating,
}

impl ImageAssessment {
    pub fn new(name: impl Into<String>, metrics: QualityMetrics) -> Self {
        let scored = QualityScorer::new().score(&metrics);
        Self {
            name: name.into(),
            metrics,
            score: scored.value,
            rating: scored.rating,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionReport {
    pub generated_at: DateTime<Utc>,
    pub method: FusionMethod,
    pub width: usize,
    pub height: usize,
    pub inputs: Vec<ImageAssessment>,
    pub fused: ImageAssessment,
    /// Fused score minus the best input score
    pub improvement: i32,
    /// Fused metrics minus the mean of the input metrics
    pub metric_deltas: QualityMetrics,
}

impl FusionReport {
    /// Analyze the inputs and the fused result
    ///
    /// `names` labels each input in order; missing labels fall back to
    /// `input_<n>`. All analyses run in parallel.
    pub fn build(names: &[String], inputs: &[Image], fused: &FusionResult, fused_name: &str) -> Self {
        let analyzer = QualityAnalyzer::new();

        let all: Vec<&Image> = inputs.iter().chain(std::iter::once(&fused.image)).collect();
        let mut metrics: Vec<QualityMetrics> = all.par_iter().map(|image| analyzer.analyze(image)).collect();
        let fused_metrics = metrics.pop().unwrap_or_default();

        let input_assessments: Vec<ImageAssessment> = metrics
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let name = names.get(i).cloned().unwrap_or_else(|| format!("input_{}", i + 1));
                ImageAssessment::new(name, *m)
            })
            .collect();

        let fused_assessment = ImageAssessment::new(fused_name, fused_metrics);
        let best_input = input_assessments.iter().map(|a| a.score).max().unwrap_or(0);
        let mean_input = QualityMetrics::mean(&metrics).unwrap_or_default();

        Self {
            generated_at: Utc::now(),
            method: fused.method,
            width: fused.image.width(),
            height: fused.image.height(),
            inputs: input_assessments,
            improvement: fused_assessment.score as i32 - best_input as i32,
            metric_deltas: fused_metrics.delta(&mean_input),
            fused: fused_assessment,
        }
    }

    /// Short hints about weaknesses remaining in the fused image
    pub fn recommendations(&self) -> Vec<String> {
        let m = &self.fused.metrics;
        let mut hints = Vec::new();

        if m.sharpness < LOW_SHARPNESS {
            hints.push("Fused image is soft; try the laplacian method or sharper source captures".to_string());
        }
        if m.contrast < LOW_CONTRAST {
            hints.push("Low contrast; sources may be hazy or under-exposed".to_string());
        }
        if m.snr < LOW_SNR {
            hints.push("Dark regions are noisy; consider adding more captures of the scene".to_string());
        }
        if m.edge_density < LOW_EDGE_DENSITY {
            hints.push("Few structural edges detected; damage outlines may be hard to read".to_string());
        }
        if self.improvement < 0 {
            hints.push(format!(
                "Fusion scored {} points below the best input; compare against {} directly",
                -self.improvement,
                self.best_input().map(|a| a.name.as_str()).unwrap_or("the sources")
            ));
        }
        hints
    }

    /// Highest scoring input (first on ties)
    pub fn best_input(&self) -> Option<&ImageAssessment> {
        self.inputs
            .iter()
            .reduce(|best, a| if a.score > best.score { a } else { best })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize fusion report to JSON")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        fs::write(path, json).with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_fusion::{fuse, Channels};
    use tempfile::tempdir;

    fn checkerboard(size: usize, cell: usize) -> Image {
        Image::from_fn(size, size, Channels::Gray, |x, y, _| {
            if (x / cell + y / cell) % 2 == 0 { 20 } else { 230 }
        })
        .unwrap()
    }

    fn sample_report() -> FusionReport {
        let inputs = vec![checkerboard(32, 2), Image::filled(32, 32, Channels::Gray, 90).unwrap()];
        let fused = fuse(&inputs, FusionMethod::Weighted, None).unwrap();
        FusionReport::build(&["sharp.png".to_string()], &inputs, &fused, "fused.jpg")
    }

    #[test]
    fn test_report_covers_every_image() {
        let report = sample_report();
        assert_eq!(report.inputs.len(), 2);
        assert_eq!(report.inputs[0].name, "sharp.png");
        assert_eq!(report.inputs[1].name, "input_2");
        assert_eq!(report.fused.name, "fused.jpg");
        assert_eq!((report.width, report.height), (32, 32));
        assert_eq!(report.method, FusionMethod::Weighted);
    }

    #[test]
    fn test_improvement_is_relative_to_best_input() {
        let report = sample_report();
        let best = report.best_input().unwrap();
        assert_eq!(best.name, "sharp.png");
        assert_eq!(report.improvement, report.fused.score as i32 - best.score as i32);
    }

    #[test]
    fn test_flat_result_gets_recommendations() {
        let inputs = vec![Image::filled(16, 16, Channels::Gray, 100).unwrap()];
        let fused = fuse(&inputs, FusionMethod::Adaptive, None).unwrap();
        let report = FusionReport::build(&[], &inputs, &fused, "fused.jpg");
        assert_eq!(report.improvement, 0);
        // Soft, low contrast and edgeless, but snr is 100
        assert_eq!(report.recommendations().len(), 3);
    }

    #[test]
    fn test_report_json_round_trip() -> Result<()> {
        let report = sample_report();
        let dir = tempdir()?;
        let path = dir.path().join("report.json");
        report.write_to(&path)?;

        let parsed: FusionReport = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(parsed, report);
        assert!(report.to_json()?.contains("\"method\": \"weighted\""));
        Ok(())
    }
}
