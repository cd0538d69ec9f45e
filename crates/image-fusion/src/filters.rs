//! Neighbourhood filters shared by the analyzer and the fusion strategies
//!
//! All filters mirror the border without repeating the edge sample
//! (`dcb|abcd|cba` style reflection), so a constant image stays constant
//! under every filter here.

use crate::raster::FloatImage;

/// Reflect an out-of-range coordinate back into `0..len`
#[inline]
pub fn reflect101(i: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let last = len as isize - 1;
    let mut i = i;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }
    i as usize
}

/// Normalised (2r+1)x(2r+1) box filter over an interleaved buffer
///
/// Runs as two separable passes so cost is independent of the radius squared.
pub fn box_filter(data: &[f32], width: usize, height: usize, channels: usize, radius: usize) -> Vec<f32> {
    let r = radius as isize;
    let norm = 1.0 / (2 * radius + 1) as f32;

    let mut horizontal = vec![0.0f32; data.len()];
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            for ch in 0..channels {
                let mut sum = 0.0;
                for dx in -r..=r {
                    let sx = reflect101(x as isize + dx, width);
                    sum += data[(row + sx) * channels + ch];
                }
                horizontal[(row + x) * channels + ch] = sum * norm;
            }
        }
    }

    let mut out = vec![0.0f32; data.len()];
    for y in 0..height {
        for x in 0..width {
            for ch in 0..channels {
                let mut sum = 0.0;
                for dy in -r..=r {
                    let sy = reflect101(y as isize + dy, height);
                    sum += horizontal[(sy * width + x) * channels + ch];
                }
                out[(y * width + x) * channels + ch] = sum * norm;
            }
        }
    }
    out
}

/// Box filter applied to every channel of a working image
pub fn box_blur(image: &FloatImage, radius: usize) -> FloatImage {
    FloatImage {
        width: image.width,
        height: image.height,
        channels: image.channels,
        data: box_filter(&image.data, image.width, image.height, image.channels, radius),
    }
}

/// 4-neighbour Laplacian of a single-channel plane
///
/// Kernel:
/// ```text
/// [ 0  1  0 ]
/// [ 1 -4  1 ]
/// [ 0  1  0 ]
/// ```
pub fn laplacian(plane: &[f32], width: usize, height: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(plane.len());
    for y in 0..height {
        let up = reflect101(y as isize - 1, height);
        let down = reflect101(y as isize + 1, height);
        for x in 0..width {
            let left = reflect101(x as isize - 1, width);
            let right = reflect101(x as isize + 1, width);
            let center = plane[y * width + x];
            out.push(
                plane[up * width + x] + plane[down * width + x] + plane[y * width + left]
                    + plane[y * width + right]
                    - 4.0 * center,
            );
        }
    }
    out
}

/// Population mean and standard deviation
pub fn mean_std<I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: Clone,
{
    let iter = values.into_iter();
    let (sum, count) = iter.clone().fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / count as f64;
    let variance = iter.map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
    (mean, variance.sqrt())
}

/// Blur with a 3x3 box then keep every other sample in each direction
///
/// Output size is `ceil(dim / 2)`, never less than one pixel.
pub fn pyr_down(image: &FloatImage) -> FloatImage {
    let blurred = box_blur(image, 1);
    let width = ((image.width + 1) / 2).max(1);
    let height = ((image.height + 1) / 2).max(1);
    let c = image.channels;

    let mut out = FloatImage::zeros(width, height, c);
    for y in 0..height {
        for x in 0..width {
            let src = ((2 * y) * image.width + 2 * x) * c;
            let dst = (y * width + x) * c;
            out.data[dst..dst + c].copy_from_slice(&blurred.data[src..src + c]);
        }
    }
    out
}

/// Upsample back to an explicit finer-level size
pub fn pyr_up(image: &FloatImage, width: usize, height: usize) -> FloatImage {
    image.resize_bilinear(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect101() {
        assert_eq!(reflect101(-1, 5), 1);
        assert_eq!(reflect101(-2, 5), 2);
        assert_eq!(reflect101(5, 5), 3);
        assert_eq!(reflect101(6, 5), 2);
        assert_eq!(reflect101(3, 5), 3);
        assert_eq!(reflect101(-3, 1), 0);
        assert_eq!(reflect101(-2, 2), 0);
    }

    #[test]
    fn test_box_filter_constant_plane() {
        let plane = vec![9.0; 6 * 4];
        let out = box_filter(&plane, 6, 4, 1, 2);
        assert!(out.iter().all(|&v| (v - 9.0).abs() < 1e-5));
    }

    #[test]
    fn test_box_filter_averages_neighbourhood() {
        // Single bright pixel in the middle of a 5x5 plane
        let mut plane = vec![0.0; 25];
        plane[12] = 9.0;
        let out = box_filter(&plane, 5, 5, 1, 1);
        assert!((out[12] - 1.0).abs() < 1e-5);
        assert!((out[6] - 1.0).abs() < 1e-5);
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_laplacian_of_constant_is_zero() {
        let plane = vec![128.0; 16];
        assert!(laplacian(&plane, 4, 4).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_laplacian_point_response() {
        let mut plane = vec![0.0; 9];
        plane[4] = 1.0;
        let lap = laplacian(&plane, 3, 3);
        assert_eq!(lap[4], -4.0);
        // Mirrored border sees the bright pixel from above and below
        assert_eq!(lap[1], 2.0);
        assert_eq!(lap[0], 0.0);
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((std - 2.0).abs() < 1e-12);
        assert_eq!(mean_std(Vec::<f64>::new()), (0.0, 0.0));
    }

    #[test]
    fn test_pyr_down_halves_and_floors_at_one() {
        let img = FloatImage::zeros(17, 9, 3);
        let down = pyr_down(&img);
        assert_eq!((down.width, down.height, down.channels), (9, 5, 3));

        let tiny = FloatImage::zeros(1, 1, 1);
        let down = pyr_down(&tiny);
        assert_eq!((down.width, down.height), (1, 1));
    }
}
