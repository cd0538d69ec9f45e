//! Laplacian-pyramid fusion
//!
//! Each pairwise blend decomposes both operands into band-pass residuals and
//! keeps, per pixel and per scale, the residual of whichever operand is more
//! active there. The coarsest band is averaged. Images are folded left to
//! right, so `[a, b, c]` fuses as `blend(blend(a, b), c)`.

use crate::filters::{box_filter, pyr_down, pyr_up};
use crate::raster::FloatImage;
use tracing::trace;

/// Octaves of decomposition, independent of input resolution
pub const PYRAMID_DEPTH: usize = 4;

/// Radius of the box filter smoothing the residual magnitude
const ACTIVITY_RADIUS: usize = 1;

/// Per-call decomposition of one operand
///
/// `gaussian` holds `PYRAMID_DEPTH + 1` levels, finest first. `residuals`
/// holds one band per octave; the coarsest Gaussian level is the base band.
struct Pyramid {
    gaussian: Vec<FloatImage>,
    residuals: Vec<FloatImage>,
}

impl Pyramid {
    fn build(image: &FloatImage) -> Self {
        let mut gaussian = Vec::with_capacity(PYRAMID_DEPTH + 1);
        gaussian.push(image.clone());
        for level in 0..PYRAMID_DEPTH {
            let next = pyr_down(&gaussian[level]);
            gaussian.push(next);
        }

        let residuals = (0..PYRAMID_DEPTH)
            .map(|level| {
                let fine = &gaussian[level];
                let up = pyr_up(&gaussian[level + 1], fine.width, fine.height);
                subtract(fine, &up)
            })
            .collect();

        Self { gaussian, residuals }
    }

    fn base(&self) -> &FloatImage {
        &self.gaussian[PYRAMID_DEPTH]
    }
}

pub(crate) fn fuse_laplacian(images: &[FloatImage]) -> FloatImage {
    let mut iter = images.iter();
    let Some(first) = iter.next() else {
        return FloatImage::zeros(0, 0, 1);
    };

    iter.fold(first.clone(), |acc, next| blend_pair(&acc, next))
}

/// Blend two same-shaped images through their Laplacian pyramids
fn blend_pair(a: &FloatImage, b: &FloatImage) -> FloatImage {
    let pa = Pyramid::build(a);
    let pb = Pyramid::build(b);

    let selected: Vec<FloatImage> = pa
        .residuals
        .iter()
        .zip(&pb.residuals)
        .enumerate()
        .map(|(level, (ra, rb))| {
            let (band, from_a) = select_by_activity(ra, rb);
            trace!(
                "Pyramid level {} ({}x{}): {} of {} pixels from first operand",
                level,
                ra.width,
                ra.height,
                from_a,
                ra.width * ra.height
            );
            band
        })
        .collect();

    let base = average(pa.base(), pb.base());
    reconstruct(base, &selected)
}

/// Per-pixel hard selection between two residual bands
///
/// Returns the selected band and how many pixels came from `a`. Ties go to `a`.
fn select_by_activity(a: &FloatImage, b: &FloatImage) -> (FloatImage, usize) {
    let activity_a = activity(a);
    let activity_b = activity(b);
    let c = a.channels;

    let mut out = FloatImage::zeros(a.width, a.height, c);
    let mut from_a = 0;
    for (i, (&act_a, &act_b)) in activity_a.iter().zip(&activity_b).enumerate() {
        let source = if act_a >= act_b {
            from_a += 1;
            a
        } else {
            b
        };
        out.data[i * c..(i + 1) * c].copy_from_slice(&source.data[i * c..(i + 1) * c]);
    }
    (out, from_a)
}

/// Box-filtered mean absolute residual across channels
fn activity(band: &FloatImage) -> Vec<f32> {
    let c = band.channels as f32;
    let magnitude: Vec<f32> = band
        .data
        .chunks_exact(band.channels)
        .map(|px| px.iter().map(|v| v.abs()).sum::<f32>() / c)
        .collect();
    box_filter(&magnitude, band.width, band.height, 1, ACTIVITY_RADIUS)
}

/// Collapse from the base band upward, adding each finer residual
fn reconstruct(base: FloatImage, residuals: &[FloatImage]) -> FloatImage {
    residuals.iter().rev().fold(base, |coarse, residual| {
        let up = pyr_up(&coarse, residual.width, residual.height);
        add(&up, residual)
    })
}

fn subtract(a: &FloatImage, b: &FloatImage) -> FloatImage {
    zip_with(a, b, |x, y| x - y)
}

fn add(a: &FloatImage, b: &FloatImage) -> FloatImage {
    zip_with(a, b, |x, y| x + y)
}

fn average(a: &FloatImage, b: &FloatImage) -> FloatImage {
    zip_with(a, b, |x, y| 0.5 * x + 0.5 * y)
}

fn zip_with<F: Fn(f32, f32) -> f32>(a: &FloatImage, b: &FloatImage, f: F) -> FloatImage {
    debug_assert!(a.same_shape(b));
    FloatImage {
        width: a.width,
        height: a.height,
        channels: a.channels,
        data: a.data.iter().zip(&b.data).map(|(&x, &y)| f(x, y)).collect(),
    }
}
