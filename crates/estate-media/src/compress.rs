//! Image normalization and compression for report photos.
//!
//! Every uploaded image is decoded, flattened to opaque RGB, bounded to
//! 1280 px per axis, and re-encoded as JPEG. Encoding starts at quality 85
//! and steps down by 5 until the output fits in 1 MiB or the quality floor
//! of 20 is reached; a quality-20 result over the limit is accepted as-is,
//! so the size cap is best-effort rather than a hard contract.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage, Rgba};
use thiserror::Error;

/// Longest permitted edge after downscaling. Smaller images are never upscaled.
pub const MAX_DIMENSION: u32 = 1280;
/// Target output size: 1 MiB.
pub const TARGET_BYTES: usize = 1_048_576;

const START_QUALITY: u8 = 85;
const QUALITY_FLOOR: u8 = 20;
const QUALITY_STEP: u8 = 5;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unsupported image format: {0}")]
    UnsupportedImageFormat(image::ImageError),
    #[error("jpeg encoding failed: {0}")]
    Encode(image::ImageError),
}

#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub quality: u8,
    pub width: u32,
    pub height: u32,
}

/// Run the full pipeline over raw upload bytes.
///
/// Decode failure is the only caller-visible error worth acting on: per the
/// portal's save semantics it must be logged and skipped, never allowed to
/// abort the owning record's save.
pub fn compress_image(raw: &[u8]) -> Result<CompressedImage, MediaError> {
    let decoded = image::load_from_memory(raw).map_err(MediaError::UnsupportedImageFormat)?;

    let rgb = flatten_to_rgb(decoded);
    let rgb = bound_dimensions(rgb);
    encode_to_target(&rgb)
}

/// Normalize color: alpha is composited onto an opaque white background,
/// palette/greyscale sources become full 3-channel color.
fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, &Rgba([r, g, b, a])) in rgba.enumerate_pixels() {
        let a = a as u16;
        let blend = |c: u8| ((c as u16 * a + 255 * (255 - a)) / 255) as u8;
        out.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// Downscale so neither axis exceeds [`MAX_DIMENSION`], preserving aspect
/// ratio with a Lanczos filter. In-bounds images pass through untouched.
fn bound_dimensions(rgb: RgbImage) -> RgbImage {
    if rgb.width() <= MAX_DIMENSION && rgb.height() <= MAX_DIMENSION {
        return rgb;
    }
    DynamicImage::ImageRgb8(rgb)
        .resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
        .to_rgb8()
}

fn encode_to_target(rgb: &RgbImage) -> Result<CompressedImage, MediaError> {
    let mut quality = START_QUALITY;
    loop {
        let mut bytes = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
        encoder.encode_image(rgb).map_err(MediaError::Encode)?;

        if bytes.len() <= TARGET_BYTES || quality <= QUALITY_FLOOR {
            return Ok(CompressedImage {
                bytes,
                quality,
                width: rgb.width(),
                height: rgb.height(),
            });
        }
        quality -= QUALITY_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(img: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    /// Noisy pixels defeat PNG/JPEG compression enough to exercise the
    /// quality loop on large inputs.
    fn noisy_rgb(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = (x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17))) as u8;
            Rgb([v, v.wrapping_mul(7), v.wrapping_add(x as u8)])
        })
    }

    #[test]
    fn garbage_bytes_are_unsupported() {
        let err = compress_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, MediaError::UnsupportedImageFormat(_)));
    }

    #[test]
    fn oversized_image_is_bounded_to_max_dimension() {
        let raw = png_bytes(DynamicImage::ImageRgb8(noisy_rgb(3000, 1500)));
        let out = compress_image(&raw).unwrap();
        assert!(out.width <= MAX_DIMENSION);
        assert!(out.height <= MAX_DIMENSION);
        // aspect ratio preserved: 2:1 input stays 2:1
        assert_eq!(out.width, 1280);
        assert_eq!(out.height, 640);
    }

    #[test]
    fn small_image_is_not_upscaled() {
        let raw = png_bytes(DynamicImage::ImageRgb8(noisy_rgb(320, 200)));
        let out = compress_image(&raw).unwrap();
        assert_eq!((out.width, out.height), (320, 200));
    }

    #[test]
    fn output_fits_target_or_hit_quality_floor() {
        let raw = png_bytes(DynamicImage::ImageRgb8(noisy_rgb(1280, 1280)));
        let out = compress_image(&raw).unwrap();
        assert!(out.bytes.len() <= TARGET_BYTES || out.quality == QUALITY_FLOOR);
    }

    #[test]
    fn alpha_is_flattened_onto_white() {
        // Fully transparent image: every pixel must come out white.
        let rgba = RgbaImage::from_pixel(8, 8, image::Rgba([200, 10, 10, 0]));
        let raw = png_bytes(DynamicImage::ImageRgba8(rgba));
        let out = compress_image(&raw).unwrap();

        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert!(!decoded.color().has_alpha());
        let rgb = decoded.to_rgb8();
        let Rgb([r, g, b]) = *rgb.get_pixel(4, 4);
        // JPEG is lossy; allow a small tolerance around pure white
        assert!(r > 250 && g > 250 && b > 250, "got ({r},{g},{b})");
    }

    #[test]
    fn opaque_output_never_carries_alpha() {
        let rgba = RgbaImage::from_pixel(16, 16, image::Rgba([40, 90, 160, 255]));
        let raw = png_bytes(DynamicImage::ImageRgba8(rgba));
        let out = compress_image(&raw).unwrap();
        let decoded = image::load_from_memory(&out.bytes).unwrap();
        assert!(!decoded.color().has_alpha());
    }
}
