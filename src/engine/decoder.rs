// src/engine/decoder.rs
//
// Decoder operations: JPEG (mozjpeg), WebP (libwebp), everything else via the image crate.
// Every decode error carries the name of the source that failed.

use crate::engine::common::run_decode_with_panic_policy;
use crate::error::ConvertError;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use mozjpeg::Decompress;
use std::io::Cursor;
use webp::{BitstreamFeatures, Decoder as WebPDecoder};

use crate::engine::{MAX_DIMENSION, MAX_PIXELS};

type DecoderResult<T> = std::result::Result<T, ConvertError>;

/// Decode JPEG using mozjpeg (backed by libjpeg-turbo)
pub fn decode_jpeg_mozjpeg(name: &str, data: &[u8]) -> DecoderResult<DynamicImage> {
    run_decode_with_panic_policy(name, "decode:mozjpeg", || {
        let fail = |message: String| ConvertError::decode_failed(name.to_string(), message);

        if !data.windows(2).any(|pair| pair == [0xFF, 0xD9]) {
            return Err(fail("missing JPEG EOI marker".to_string()));
        }

        let decompress = Decompress::new_mem(data)
            .map_err(|e| fail(format!("mozjpeg decompress init failed: {e:?}")))?;

        let mut decompress = decompress
            .rgb()
            .map_err(|e| fail(format!("mozjpeg rgb conversion failed: {e:?}")))?;

        let width = decompress.width();
        let height = decompress.height();
        if width > MAX_DIMENSION as usize || height > MAX_DIMENSION as usize {
            return Err(ConvertError::dimension_exceeds_limit(
                width.max(height) as u32,
                MAX_DIMENSION,
            ));
        }
        let width_u32 = width as u32;
        let height_u32 = height as u32;
        check_dimensions(width_u32, height_u32)?;

        let pixels: Vec<[u8; 3]> = decompress
            .read_scanlines()
            .map_err(|e| fail(format!("failed to read scanlines: {e:?}")))?;
        let flat_pixels: Vec<u8> = pixels.into_iter().flatten().collect();

        let rgb_image = RgbImage::from_raw(width_u32, height_u32, flat_pixels)
            .ok_or_else(|| fail("failed to create image from raw data".to_string()))?;

        Ok(DynamicImage::ImageRgb8(rgb_image))
    })
}

/// Decode WebP using libwebp. Animated WebP falls back to the image crate (first frame).
pub fn decode_webp_libwebp(name: &str, data: &[u8]) -> DecoderResult<DynamicImage> {
    run_decode_with_panic_policy(name, "decode:webp", || {
        let features = BitstreamFeatures::new(data).ok_or_else(|| {
            ConvertError::decode_failed(name.to_string(), "webp: failed to read bitstream features")
        })?;

        if features.has_animation() {
            return decode_with_image_crate(name, data);
        }

        check_dimensions(features.width(), features.height())?;

        let decoded = WebPDecoder::new(data)
            .decode()
            .ok_or_else(|| ConvertError::decode_failed(name.to_string(), "webp: decode failed"))?;

        check_dimensions(decoded.width(), decoded.height())?;
        Ok(decoded.to_image())
    })
}

/// Decode PNG, GIF (first frame) and BMP with the image crate.
pub fn decode_with_image_crate(name: &str, data: &[u8]) -> DecoderResult<DynamicImage> {
    run_decode_with_panic_policy(name, "decode:image", || {
        image::load_from_memory(data)
            .map_err(|e| ConvertError::decode_failed(name.to_string(), e.to_string()))
    })
}

/// Detect input format using magic bytes. Returns None if unknown.
///
/// The declared MIME type only gates admission; routing uses the actual bytes.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Unified decode entrypoint:
/// - Reject oversized images from the header before allocating pixels
/// - Route JPEG to mozjpeg, WebP to libwebp, others to the image crate
/// - Return decoded image and detected format
pub fn decode_image(name: &str, bytes: &[u8]) -> DecoderResult<(DynamicImage, ImageFormat)> {
    if bytes.is_empty() {
        return Err(ConvertError::decode_failed(name.to_string(), "empty input"));
    }
    let detected = detect_format(bytes).ok_or_else(|| {
        ConvertError::decode_failed(name.to_string(), "unrecognized image data")
    })?;

    ensure_dimensions_safe(bytes)?;

    let img = match detected {
        ImageFormat::Jpeg => decode_jpeg_mozjpeg(name, bytes)?,
        ImageFormat::WebP => decode_webp_libwebp(name, bytes)?,
        ImageFormat::Png | ImageFormat::Gif | ImageFormat::Bmp => {
            decode_with_image_crate(name, bytes)?
        }
        other => {
            return Err(ConvertError::decode_failed(
                name.to_string(),
                format!("format {other:?} is not accepted"),
            ))
        }
    };

    check_dimensions(img.width(), img.height())?;
    Ok((img, detected))
}

/// Check if image dimensions are within safe limits.
/// Returns an error if the image is too large (potential decompression bomb).
pub fn check_dimensions(width: u32, height: u32) -> DecoderResult<()> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(ConvertError::dimension_exceeds_limit(
            width.max(height),
            MAX_DIMENSION,
        ));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_PIXELS {
        return Err(ConvertError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
    }
    Ok(())
}

/// Inspect encoded bytes and ensure the image dimensions are safe before decoding.
pub fn ensure_dimensions_safe(bytes: &[u8]) -> DecoderResult<()> {
    let cursor = Cursor::new(bytes);
    if let Ok(reader) = ImageReader::new(cursor).with_guessed_format() {
        if let Ok((width, height)) = reader.into_dimensions() {
            return check_dimensions(width, height);
        }
    }
    Ok(())
}
