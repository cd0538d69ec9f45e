//! Conversion between encoded image files and the fusion core's [`Image`]
//!
//! Decoding goes through the `image` crate with format sniffing, so anything
//! it can read (JPEG, PNG, TIFF, WebP, ...) is accepted. Gray sources stay
//! single-channel; everything else is flattened to 8-bit RGB.

use anyhow::{bail, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, GrayImage, ImageEncoder, ImageReader, RgbImage};
use image_fusion::{Channels, Image};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::info;

/// Encoded output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Pick a format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            _ => bail!(
                "Unsupported output extension for {}. Valid options: jpg, jpeg, png",
                path.display()
            ),
        }
    }
}

/// Convert a decoded image into the core representation
pub fn from_dynamic(img: DynamicImage) -> Result<Image> {
    let image = match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => {
            let gray = img.to_luma8();
            let (w, h) = gray.dimensions();
            Image::new(w as usize, h as usize, Channels::Gray, gray.into_raw())?
        }
        other => {
            let rgb = other.to_rgb8();
            let (w, h) = rgb.dimensions();
            Image::new(w as usize, h as usize, Channels::Rgb, rgb.into_raw())?
        }
    };
    Ok(image)
}

/// Convert a core image back into an `image` crate buffer
pub fn to_dynamic(image: &Image) -> Result<DynamicImage> {
    let (w, h) = (image.width() as u32, image.height() as u32);
    let raw = image.as_raw().to_vec();
    let dynamic = match image.channels() {
        Channels::Gray => GrayImage::from_raw(w, h, raw).map(DynamicImage::ImageLuma8),
        Channels::Rgb => RgbImage::from_raw(w, h, raw).map(DynamicImage::ImageRgb8),
    };
    dynamic.context("Pixel buffer does not match image dimensions")
}

/// Decode an in-memory encoded image
pub fn decode_image(bytes: &[u8]) -> Result<Image> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
        .context("Failed to decode image data")?;
    from_dynamic(img)
}

/// Load and decode an image file
pub fn load_image(path: &Path) -> Result<Image> {
    let img = ImageReader::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .with_guessed_format()?
        .decode()
        .with_context(|| format!("Failed to decode image {}", path.display()))?;
    from_dynamic(img)
}

/// Encode an image; `quality` only applies to JPEG
pub fn encode_image(image: &Image, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    let (w, h) = (image.width() as u32, image.height() as u32);
    let color = match image.channels() {
        Channels::Gray => ExtendedColorType::L8,
        Channels::Rgb => ExtendedColorType::Rgb8,
    };

    let mut buffer = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
            encoder
                .encode(image.as_raw(), w, h, color)
                .context("Failed to encode JPEG")?;
        }
        OutputFormat::Png => {
            PngEncoder::new(&mut buffer)
                .write_image(image.as_raw(), w, h, color)
                .context("Failed to encode PNG")?;
        }
    }
    Ok(buffer)
}

/// Encode and write an image, choosing the format from the extension
pub fn save_image(image: &Image, path: &Path, quality: u8) -> Result<()> {
    let format = OutputFormat::from_path(path)?;
    let bytes = encode_image(image, format, quality)?;
    fs::write(path, &bytes).with_context(|| format!("Failed to write image to {}", path.display()))?;
    info!("Wrote {}x{} image to {}", image.width(), image.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn gradient(channels: Channels) -> Image {
        Image::from_fn(16, 8, channels, |x, y, ch| (x * 12 + y * 3 + ch * 40) as u8).unwrap()
    }

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.JPG")).unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path(Path::new("out.jpeg")).unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_path(Path::new("a/b/out.png")).unwrap(), OutputFormat::Png);
        assert!(OutputFormat::from_path(Path::new("out.gif")).is_err());
        assert!(OutputFormat::from_path(Path::new("out")).is_err());
    }

    #[test]
    fn test_png_is_lossless() -> Result<()> {
        for channels in [Channels::Gray, Channels::Rgb] {
            let img = gradient(channels);
            let bytes = encode_image(&img, OutputFormat::Png, 90)?;
            assert_eq!(decode_image(&bytes)?, img);
        }
        Ok(())
    }

    #[test]
    fn test_jpeg_keeps_shape() -> Result<()> {
        let img = gradient(Channels::Rgb);
        let bytes = encode_image(&img, OutputFormat::Jpeg, 95)?;
        let decoded = decode_image(&bytes)?;
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.channels(), Channels::Rgb);
        Ok(())
    }

    #[test]
    fn test_alpha_is_dropped() -> Result<()> {
        let rgba = DynamicImage::new_rgba8(4, 3);
        let img = from_dynamic(rgba)?;
        assert_eq!(img.channels(), Channels::Rgb);
        assert_eq!(img.as_raw().len(), 4 * 3 * 3);
        Ok(())
    }

    #[test]
    fn test_save_and_load_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("fused.png");
        let img = gradient(Channels::Gray);
        save_image(&img, &path, 90)?;
        assert_eq!(load_image(&path)?, img);
        Ok(())
    }

    #[test]
    fn test_undecodable_input_is_an_error() {
        assert!(decode_image(b"definitely not an image").is_err());

        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.jpg");
        let err = load_image(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.jpg"));
    }
}
