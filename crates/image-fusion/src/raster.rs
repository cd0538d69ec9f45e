//! Image buffers used throughout the fusion pipeline
//!
//! [`Image`] is the terminal 8-bit representation handed in and out of the
//! core. [`FloatImage`] is the widened working buffer every strategy blends
//! in; it is only turned back into an [`Image`] (clamped and rounded) at the
//! very end of a call.

use crate::error::{FusionError, Result};
use serde::{Deserialize, Serialize};

/// Number of interleaved samples per pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channels {
    Gray,
    Rgb,
}

impl Channels {
    pub fn count(&self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
        }
    }

    pub fn from_count(count: usize) -> Result<Self> {
        match count {
            1 => Ok(Channels::Gray),
            3 => Ok(Channels::Rgb),
            n => Err(FusionError::InvalidInput(format!(
                "unsupported channel count {} (expected 1 or 3)",
                n
            ))),
        }
    }
}

/// Dense 8-bit image, row-major with interleaved channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    channels: Channels,
    data: Vec<u8>,
}

impl Image {
    /// Wrap a pixel buffer, checking that its length matches the shape
    pub fn new(width: usize, height: usize, channels: Channels, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FusionError::InvalidInput(format!(
                "image dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        let expected = width * height * channels.count();
        if data.len() != expected {
            return Err(FusionError::InvalidInput(format!(
                "pixel buffer holds {} samples, {}x{}x{} needs {}",
                data.len(),
                width,
                height,
                channels.count(),
                expected
            )));
        }
        Ok(Self { width, height, channels, data })
    }

    /// Image with every sample set to `value`
    pub fn filled(width: usize, height: usize, channels: Channels, value: u8) -> Result<Self> {
        Self::new(width, height, channels, vec![value; width * height * channels.count()])
    }

    /// Build an image by evaluating `f(x, y, channel)` for every sample
    pub fn from_fn<F>(width: usize, height: usize, channels: Channels, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize, usize) -> u8,
    {
        let c = channels.count();
        let mut data = Vec::with_capacity(width * height * c);
        for y in 0..height {
            for x in 0..width {
                for ch in 0..c {
                    data.push(f(x, y, ch));
                }
            }
        }
        Self::new(width, height, channels, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Sample at (x, y) in channel `ch`
    pub fn get(&self, x: usize, y: usize, ch: usize) -> u8 {
        self.data[(y * self.width + x) * self.channels.count() + ch]
    }

    /// Luma plane using BT.601 weights, rounded to 8 bits
    pub fn to_gray(&self) -> Vec<u8> {
        match self.channels {
            Channels::Gray => self.data.clone(),
            Channels::Rgb => self
                .data
                .chunks_exact(3)
                .map(|px| luma(px[0] as f32, px[1] as f32, px[2] as f32).round() as u8)
                .collect(),
        }
    }
}

/// BT.601 luma
#[inline]
pub fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Real-valued working buffer with the same layout as [`Image`]
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl FloatImage {
    pub fn zeros(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0.0; width * height * channels],
        }
    }

    pub fn from_image(image: &Image) -> Self {
        Self {
            width: image.width,
            height: image.height,
            channels: image.channels.count(),
            data: image.data.iter().map(|&v| v as f32).collect(),
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, ch: usize) -> f32 {
        self.data[(y * self.width + x) * self.channels + ch]
    }

    pub fn same_shape(&self, other: &FloatImage) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }

    /// Per-pixel luma plane (identity for single-channel buffers)
    pub fn gray_plane(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.data.clone();
        }
        self.data
            .chunks_exact(self.channels)
            .map(|px| luma(px[0], px[1], px[2]))
            .collect()
    }

    /// Bilinear resample to `width` x `height` using pixel-centre alignment
    pub fn resize_bilinear(&self, width: usize, height: usize) -> FloatImage {
        if width == self.width && height == self.height {
            return self.clone();
        }

        let c = self.channels;
        let mut out = FloatImage::zeros(width, height, c);
        let scale_x = self.width as f32 / width as f32;
        let scale_y = self.height as f32 / height as f32;
        let max_x = self.width - 1;
        let max_y = self.height - 1;

        for y in 0..height {
            let sy = ((y as f32 + 0.5) * scale_y - 0.5).max(0.0);
            let y0 = (sy.floor() as usize).min(max_y);
            let y1 = (y0 + 1).min(max_y);
            let fy = (sy - y0 as f32).clamp(0.0, 1.0);

            for x in 0..width {
                let sx = ((x as f32 + 0.5) * scale_x - 0.5).max(0.0);
                let x0 = (sx.floor() as usize).min(max_x);
                let x1 = (x0 + 1).min(max_x);
                let fx = (sx - x0 as f32).clamp(0.0, 1.0);

                for ch in 0..c {
                    let top = self.get(x0, y0, ch) * (1.0 - fx) + self.get(x1, y0, ch) * fx;
                    let bottom = self.get(x0, y1, ch) * (1.0 - fx) + self.get(x1, y1, ch) * fx;
                    out.data[(y * width + x) * c + ch] = top * (1.0 - fy) + bottom * fy;
                }
            }
        }

        out
    }

    /// Expand or collapse channels so the buffer matches `channels`
    pub fn with_channels(self, channels: usize) -> FloatImage {
        if channels == self.channels {
            return self;
        }
        if channels == 1 {
            let data = self.gray_plane();
            return FloatImage { width: self.width, height: self.height, channels: 1, data };
        }
        let data = self
            .data
            .iter()
            .flat_map(|&v| std::iter::repeat(v).take(channels))
            .collect();
        FloatImage { width: self.width, height: self.height, channels, data }
    }

    /// Clamp to [0, 255], round, and narrow back to 8 bits
    pub fn to_image(&self) -> Result<Image> {
        let data = self.data.iter().map(|&v| clamp_sample(v)).collect();
        let channels = Channels::from_count(self.channels)?;
        Image::new(self.width, self.height, channels, data)
    }
}

#[inline]
pub fn clamp_sample(v: f32) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.round().clamp(0.0, 255.0) as u8
    }
}
