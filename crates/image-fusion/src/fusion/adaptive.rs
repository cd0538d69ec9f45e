//! Local-variance adaptive fusion
//!
//! Each image contributes at each pixel in proportion to how much its luma
//! varies in a 5x5 neighbourhood, so textured regions come from whichever
//! capture resolved them best. Flat regions, where no image varies, fall
//! back to a plain average.

use crate::filters::box_filter;
use crate::raster::FloatImage;

/// Radius of the 5x5 window for local mean and variance
const WINDOW_RADIUS: usize = 2;

/// Stabiliser added to every variance before normalising
pub const VARIANCE_EPSILON: f32 = 1e-6;

/// Local variance of a single-channel plane
fn local_variance(plane: &[f32], width: usize, height: usize) -> Vec<f32> {
    let mean = box_filter(plane, width, height, 1, WINDOW_RADIUS);
    let squared_dev: Vec<f32> = plane.iter().zip(&mean).map(|(&v, &m)| (v - m) * (v - m)).collect();
    box_filter(&squared_dev, width, height, 1, WINDOW_RADIUS)
}

/// Per-image, per-pixel blend weights; the weights at each pixel sum to one
///
/// Inputs must share one shape. Weight planes are single-channel and apply
/// to every colour channel of the matching image.
pub fn adaptive_weights(images: &[FloatImage]) -> Vec<Vec<f32>> {
    let Some(first) = images.first() else {
        return Vec::new();
    };
    let (width, height) = (first.width, first.height);
    let n = images.len() as f32;

    let variances: Vec<Vec<f32>> = images
        .iter()
        .map(|image| local_variance(&image.gray_plane(), width, height))
        .collect();

    let mut totals = vec![0.0f32; width * height];
    for variance in &variances {
        for (total, &v) in totals.iter_mut().zip(variance) {
            *total += v;
        }
    }

    variances
        .into_iter()
        .map(|variance| {
            variance
                .iter()
                .zip(&totals)
                .map(|(&v, &total)| (v + VARIANCE_EPSILON) / (total + n * VARIANCE_EPSILON))
                .collect()
        })
        .collect()
}

pub(crate) fn fuse_adaptive(images: &[FloatImage]) -> FloatImage {
    let first = &images[0];
    let c = first.channels;
    let weights = adaptive_weights(images);

    let mut out = FloatImage::zeros(first.width, first.height, c);
    for (image, weight) in images.iter().zip(&weights) {
        for (pixel, (acc, src)) in out.data.chunks_exact_mut(c).zip(image.data.chunks_exact(c)).enumerate() {
            let w = weight[pixel];
            for (a, &s) in acc.iter_mut().zip(src) {
                *a += w * s;
            }
        }
    }
    out
}
