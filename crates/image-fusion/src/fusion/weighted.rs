//! Weighted-average fusion

use crate::raster::FloatImage;

/// `1/n` for each of `n` images
pub fn uniform_weights(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}

/// Per-sample `Σ weight_i · pixel_i`
///
/// Weights are used as given; they are not renormalised to sum to one, so
/// the caller can brighten or darken the composite deliberately. Inputs must
/// already share one shape.
pub(crate) fn fuse_weighted(images: &[FloatImage], weights: &[f64]) -> FloatImage {
    let first = &images[0];
    let mut out = FloatImage::zeros(first.width, first.height, first.channels);

    for (image, &weight) in images.iter().zip(weights) {
        debug_assert!(image.same_shape(first));
        let weight = weight as f32;
        for (acc, &v) in out.data.iter_mut().zip(&image.data) {
            *acc += weight * v;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{fuse, FusionMethod};
    use crate::raster::{Channels, Image};

    #[test]
    fn test_uniform_weights_sum_to_one() {
        for n in 1..8 {
            let w = uniform_weights(n);
            assert_eq!(w.len(), n);
            assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        assert!(uniform_weights(0).is_empty());
    }

    #[test]
    fn test_two_image_average() {
        let a = Image::filled(4, 4, Channels::Gray, 100).unwrap();
        let b = Image::filled(4, 4, Channels::Gray, 200).unwrap();
        let result = fuse(&[a, b], FusionMethod::Weighted, None).unwrap();
        assert!(result.image.as_raw().iter().all(|&v| v == 150));
    }

    #[test]
    fn test_average_rounds_half_values() {
        let a = Image::filled(2, 2, Channels::Rgb, 10).unwrap();
        let b = Image::filled(2, 2, Channels::Rgb, 13).unwrap();
        let result = fuse(&[a, b], FusionMethod::Weighted, None).unwrap();
        // 11.5 rounds away from zero
        assert!(result.image.as_raw().iter().all(|&v| v == 12));
    }

    #[test]
    fn test_explicit_weights() {
        let a = Image::filled(3, 3, Channels::Gray, 100).unwrap();
        let b = Image::filled(3, 3, Channels::Gray, 200).unwrap();
        let result = fuse(&[a, b], FusionMethod::Weighted, Some(&[0.75, 0.25])).unwrap();
        assert!(result.image.as_raw().iter().all(|&v| v == 125));
    }

    #[test]
    fn test_overweighted_sum_clamps() {
        let a = Image::filled(3, 3, Channels::Gray, 200).unwrap();
        let b = Image::filled(3, 3, Channels::Gray, 200).unwrap();
        let result = fuse(&[a.clone(), b.clone()], FusionMethod::Weighted, Some(&[1.0, 1.0])).unwrap();
        assert!(result.image.as_raw().iter().all(|&v| v == 255));

        let result = fuse(&[a, b], FusionMethod::Weighted, Some(&[-1.0, 0.0])).unwrap();
        assert!(result.image.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_three_way_uniform() {
        let images: Vec<Image> = [30u8, 60, 90]
            .iter()
            .map(|&v| Image::filled(5, 5, Channels::Gray, v).unwrap())
            .collect();
        let result = fuse(&images, FusionMethod::Weighted, None).unwrap();
        assert!(result.image.as_raw().iter().all(|&v| v == 60));
    }

    #[test]
    fn test_mismatched_sizes_are_resized_not_rejected() {
        let a = Image::filled(8, 8, Channels::Gray, 100).unwrap();
        let b = Image::filled(3, 5, Channels::Gray, 200).unwrap();
        let result = fuse(&[a, b], FusionMethod::Weighted, None).unwrap();
        assert_eq!(result.image.dimensions(), (8, 8));
        assert!(result.image.as_raw().iter().all(|&v| v == 150));
    }
}
