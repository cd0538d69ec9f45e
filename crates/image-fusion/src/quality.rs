//! Image quality analysis
//!
//! Computes the five scalar metrics used both to score a fused composite and
//! to compare it against the source captures. Everything runs on the 8-bit
//! luma plane of the image.

use crate::filters::{laplacian, mean_std};
use crate::raster::Image;
use crate::score::QualityScorer;
use image::GrayImage;
use imageproc::edges::canny;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Canny hysteresis thresholds used for edge density
pub const EDGE_LOW_THRESHOLD: f32 = 50.0;
pub const EDGE_HIGH_THRESHOLD: f32 = 150.0;

/// Pixels darker than this fraction of the mean form the noise sample
pub const NOISE_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Variance of the Laplacian response
    pub sharpness: f64,
    /// Mean luma
    pub brightness: f64,
    /// Standard deviation of luma
    pub contrast: f64,
    /// Mean luma over the spread of the darkest pixels
    pub snr: f64,
    /// Fraction of pixels on a Canny edge (0.0 - 1.0)
    pub edge_density: f64,
}

impl QualityMetrics {
    /// Element-wise difference `self - other`
    pub fn delta(&self, other: &QualityMetrics) -> QualityMetrics {
        QualityMetrics {
            sharpness: self.sharpness - other.sharpness,
            brightness: self.brightness - other.brightness,
            contrast: self.contrast - other.contrast,
            snr: self.snr - other.snr,
            edge_density: self.edge_density - other.edge_density,
        }
    }

    /// Element-wise mean of a set of metrics, `None` when empty
    pub fn mean(all: &[QualityMetrics]) -> Option<QualityMetrics> {
        if all.is_empty() {
            return None;
        }
        let n = all.len() as f64;
        let sum = all.iter().fold(QualityMetrics::default(), |acc, m| QualityMetrics {
            sharpness: acc.sharpness + m.sharpness,
            brightness: acc.brightness + m.brightness,
            contrast: acc.contrast + m.contrast,
            snr: acc.snr + m.snr,
            edge_density: acc.edge_density + m.edge_density,
        });
        Some(QualityMetrics {
            sharpness: sum.sharpness / n,
            brightness: sum.brightness / n,
            contrast: sum.contrast / n,
            snr: sum.snr / n,
            edge_density: sum.edge_density / n,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct QualityAnalyzer;

impl QualityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Compute all metrics for one image
    pub fn analyze(&self, image: &Image) -> QualityMetrics {
        let gray = image.to_gray();
        let (width, height) = image.dimensions();

        let (brightness, contrast) = mean_std(gray.iter().map(|&v| v as f64));

        QualityMetrics {
            sharpness: laplacian_variance(&gray, width, height),
            brightness,
            contrast,
            snr: signal_to_noise(&gray, brightness),
            edge_density: edge_density(gray, width, height),
        }
    }

    /// Analyze several images on the rayon pool
    ///
    /// Each analysis is independent; results come back in input order.
    pub fn analyze_batch(&self, images: &[Image]) -> Vec<QualityMetrics> {
        images.par_iter().map(|image| self.analyze(image)).collect()
    }

    /// Order two metric sets by composite score, then by sharpness
    pub fn compare(&self, a: &QualityMetrics, b: &QualityMetrics) -> Ordering {
        let scorer = QualityScorer::new();
        match scorer.score(a).value.cmp(&scorer.score(b).value) {
            Ordering::Equal => a.sharpness.partial_cmp(&b.sharpness).unwrap_or(Ordering::Equal),
            other => other,
        }
    }
}

/// Convenience wrapper around [`QualityAnalyzer::analyze`]
pub fn analyze(image: &Image) -> QualityMetrics {
    QualityAnalyzer::new().analyze(image)
}

fn laplacian_variance(gray: &[u8], width: usize, height: usize) -> f64 {
    let plane: Vec<f32> = gray.iter().map(|&v| v as f32).collect();
    let response = laplacian(&plane, width, height);
    let (_, std) = mean_std(response.iter().map(|&v| v as f64));
    std * std
}

fn signal_to_noise(gray: &[u8], mean: f64) -> f64 {
    let cutoff = mean * NOISE_FRACTION;
    let (_, noise) = mean_std(gray.iter().map(|&v| v as f64).filter(|&v| v < cutoff));
    mean / noise.max(1.0)
}

fn edge_density(gray: Vec<u8>, width: usize, height: usize) -> f64 {
    let total = (width * height) as f64;
    let Some(buffer) = GrayImage::from_raw(width as u32, height as u32, gray) else {
        return 0.0;
    };
    let edges = canny(&buffer, EDGE_LOW_THRESHOLD, EDGE_HIGH_THRESHOLD);
    let count = edges.as_raw().iter().filter(|&&v| v > 0).count();
    count as f64 / total
}
