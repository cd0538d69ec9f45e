//! Multi-image fusion
//!
//! Three interchangeable strategies combine an ordered set of co-registered
//! images into one composite. Every strategy first brings all inputs to the
//! first image's size and channel layout, blends in `f32`, and only clamps
//! back to 8-bit samples once the blend is complete.

pub mod adaptive;
pub mod laplacian;
pub mod weighted;

use crate::error::{FusionError, Result};
use crate::raster::{FloatImage, Image};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use adaptive::adaptive_weights;
pub use laplacian::PYRAMID_DEPTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionMethod {
    /// Per-image scalar weights (uniform by default)
    Weighted,
    /// Laplacian-pyramid blend with per-scale activity selection
    Laplacian,
    /// Per-pixel weights from local luma variance
    Adaptive,
}

impl FusionMethod {
    pub const ALL: [FusionMethod; 3] = [FusionMethod::Weighted, FusionMethod::Laplacian, FusionMethod::Adaptive];

    /// Smallest image count for which the method actually blends
    pub fn min_images(&self) -> usize {
        match self {
            FusionMethod::Weighted => 1,
            FusionMethod::Laplacian | FusionMethod::Adaptive => 2,
        }
    }
}

impl std::fmt::Display for FusionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FusionMethod::Weighted => write!(f, "weighted"),
            FusionMethod::Laplacian => write!(f, "laplacian"),
            FusionMethod::Adaptive => write!(f, "adaptive"),
        }
    }
}

impl std::str::FromStr for FusionMethod {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "weighted" => Ok(FusionMethod::Weighted),
            "laplacian" => Ok(FusionMethod::Laplacian),
            "adaptive" => Ok(FusionMethod::Adaptive),
            _ => Err(FusionError::UnsupportedMethod(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionResult {
    pub image: Image,
    pub method: FusionMethod,
}

/// Stateless entry point for all fusion strategies
pub struct FusionEngine;

impl FusionEngine {
    /// Fuse `images` into a single composite with `method`
    ///
    /// `weights` is only consulted by [`FusionMethod::Weighted`]; when given
    /// it must hold one entry per image. Images smaller than 16 px on a side
    /// are accepted, but the coarse pyramid levels collapse to one pixel.
    pub fn fuse(images: &[Image], method: FusionMethod, weights: Option<&[f64]>) -> Result<FusionResult> {
        let first = images
            .first()
            .ok_or_else(|| FusionError::InvalidInput("image set is empty".to_string()))?;

        if let Some(w) = weights {
            if method == FusionMethod::Weighted && w.len() != images.len() {
                return Err(FusionError::InvalidInput(format!(
                    "{} weights supplied for {} images",
                    w.len(),
                    images.len()
                )));
            }
            if method != FusionMethod::Weighted {
                debug!("Ignoring {} weights for {} fusion", w.len(), method);
            }
        }

        if images.len() < method.min_images() {
            debug!("{} fusion with a single image, returning it unchanged", method);
            return Ok(FusionResult { image: first.clone(), method });
        }

        debug!(
            "Fusing {} images with {} method at {}x{}",
            images.len(),
            method,
            first.width(),
            first.height()
        );

        let prepared = normalize(images);
        let fused = match method {
            FusionMethod::Weighted => {
                let uniform;
                let weights = match weights {
                    Some(w) => w,
                    None => {
                        uniform = weighted::uniform_weights(prepared.len());
                        uniform.as_slice()
                    }
                };
                weighted::fuse_weighted(&prepared, weights)
            }
            FusionMethod::Laplacian => laplacian::fuse_laplacian(&prepared),
            FusionMethod::Adaptive => adaptive::fuse_adaptive(&prepared),
        };

        Ok(FusionResult { image: fused.to_image()?, method })
    }
}

/// Convenience wrapper around [`FusionEngine::fuse`]
pub fn fuse(images: &[Image], method: FusionMethod, weights: Option<&[f64]>) -> Result<FusionResult> {
    FusionEngine::fuse(images, method, weights)
}

/// Widen every image and resample it to the first image's shape
///
/// Channel layouts are reconciled too: gray inputs are broadcast into a
/// colour reference, colour inputs are reduced to luma for a gray reference.
pub(crate) fn normalize(images: &[Image]) -> Vec<FloatImage> {
    let Some(first) = images.first() else {
        return Vec::new();
    };
    let (width, height) = first.dimensions();
    let channels = first.channels().count();

    images
        .iter()
        .map(|image| {
            FloatImage::from_image(image)
                .with_channels(channels)
                .resize_bilinear(width, height)
        })
        .collect()
}
