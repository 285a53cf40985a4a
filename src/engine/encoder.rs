// src/engine/encoder.rs
//
// Encoder operations: JPEG (mozjpeg), PNG (image + oxipng), WebP (libwebp),
// GIF and BMP (image crate).

use crate::engine::common::run_with_panic_policy;
use crate::error::ConvertError;
use crate::ops::OutputFormat;
use image::{DynamicImage, ImageFormat};
use mozjpeg::{ColorSpace, Compress, ScanMode};
use std::borrow::Cow;
use std::io::Cursor;

use crate::engine::MAX_DIMENSION;

type EncoderResult<T> = std::result::Result<T, ConvertError>;

/// Derives per-format encoder knobs from a 0-100 quality value.
/// Bands:
/// - High (>=85): visual quality first
/// - Balanced (70-84)
/// - Fast (<70): size first
#[derive(Debug, Clone, Copy)]
pub struct QualitySettings {
    quality: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QualityBand {
    High,
    Balanced,
    Fast,
}

impl QualitySettings {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.min(100) as f32,
        }
    }

    fn band(&self) -> QualityBand {
        if self.quality >= 85.0 {
            QualityBand::High
        } else if self.quality >= 70.0 {
            QualityBand::Balanced
        } else {
            QualityBand::Fast
        }
    }

    /// libjpeg treats 0 as 1; keep the floor explicit.
    pub fn jpeg_quality(&self) -> f32 {
        self.quality.max(1.0)
    }

    pub fn jpeg_smoothing(&self) -> u8 {
        if self.quality >= 90.0 {
            0
        } else if self.quality >= 70.0 {
            5
        } else if self.quality >= 60.0 {
            10
        } else {
            18
        }
    }

    pub fn webp_quality(&self) -> f32 {
        self.quality
    }

    pub fn webp_sns_strength(&self) -> i32 {
        match self.band() {
            QualityBand::High => 50,
            QualityBand::Balanced => 70,
            QualityBand::Fast => 80,
        }
    }

    pub fn webp_filter_strength(&self) -> i32 {
        if self.quality >= 80.0 {
            20
        } else if self.quality >= 60.0 {
            30
        } else {
            40
        }
    }
}

/// Encode a rendered surface to `format`. `quality` is ignored by lossless formats.
///
/// An encoder that produces no bytes is treated as a failure.
pub fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> EncoderResult<Vec<u8>> {
    let bytes = match format {
        OutputFormat::Jpeg => encode_jpeg(img, quality)?,
        OutputFormat::Png => encode_png(img)?,
        OutputFormat::WebP => encode_webp(img, quality)?,
        OutputFormat::Gif => encode_gif(img)?,
        OutputFormat::Bmp => encode_bmp(img)?,
    };
    if bytes.is_empty() {
        return Err(ConvertError::encode_failed(
            format.as_str(),
            "encoder produced no output",
        ));
    }
    Ok(bytes)
}

fn validate_surface(img: &DynamicImage, format: OutputFormat) -> EncoderResult<()> {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return Err(ConvertError::encode_failed(
            format.as_str(),
            "invalid surface dimensions: width or height is zero",
        ));
    }
    if w > MAX_DIMENSION || h > MAX_DIMENSION {
        return Err(ConvertError::dimension_exceeds_limit(w.max(h), MAX_DIMENSION));
    }
    Ok(())
}

/// Encode to JPEG using mozjpeg with web-optimized settings
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:jpeg", || {
        validate_surface(img, OutputFormat::Jpeg)?;

        // Zero-copy when the surface is already RGB8
        let rgb: Cow<'_, image::RgbImage> = match img {
            DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
            _ => Cow::Owned(img.to_rgb8()),
        };
        let (w, h) = rgb.dimensions();
        let pixels: &[u8] = rgb.as_raw();

        let expected_len = (w as usize) * (h as usize) * 3;
        if pixels.len() != expected_len {
            return Err(ConvertError::encode_failed(
                "jpeg",
                format!("pixel buffer is {} bytes, expected {expected_len}", pixels.len()),
            ));
        }

        let settings = QualitySettings::new(quality);
        let mut comp = Compress::new(ColorSpace::JCS_RGB);
        comp.set_size(w as usize, h as usize);
        comp.set_color_space(ColorSpace::JCS_YCbCr);
        comp.set_chroma_sampling_pixel_sizes((2, 2), (2, 2));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);
        comp.set_optimize_scans(true);
        comp.set_scan_optimization_mode(ScanMode::AllComponentsTogether);
        // Scan mode resets the quantization tables, so quality goes after it
        comp.set_quality(settings.jpeg_quality());
        comp.set_smoothing_factor(settings.jpeg_smoothing());

        let estimated_size = (w as usize * h as usize * 3 / 10).max(4096);
        let mut output = Vec::with_capacity(estimated_size);
        {
            let mut writer = comp.start_compress(&mut output).map_err(|e| {
                ConvertError::encode_failed("jpeg", format!("failed to start compress: {e:?}"))
            })?;

            let stride = w as usize * 3;
            for row in pixels.chunks(stride) {
                writer.write_scanlines(row).map_err(|e| {
                    ConvertError::encode_failed("jpeg", format!("failed to write scanlines: {e:?}"))
                })?;
            }

            writer.finish().map_err(|e| {
                ConvertError::encode_failed("jpeg", format!("failed to finish: {e:?}"))
            })?;
        }

        Ok(output)
    })
}

/// Encode to PNG using the image crate, then recompress losslessly with oxipng
pub fn encode_png(img: &DynamicImage) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:png", || {
        validate_surface(img, OutputFormat::Png)?;

        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| ConvertError::encode_failed("png", format!("PNG encode failed: {e}")))?;

        let mut options = oxipng::Options::from_preset(2);
        options.strip = oxipng::StripChunks::Safe;

        oxipng::optimize_from_memory(&buf, &options).map_err(|e| {
            ConvertError::encode_failed("png", format!("oxipng optimization failed: {e}"))
        })
    })
}

/// Encode to lossy WebP. Alpha is kept only when the surface has an alpha channel.
pub fn encode_webp(img: &DynamicImage, quality: u8) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:webp", || {
        validate_surface(img, OutputFormat::WebP)?;

        let settings = QualitySettings::new(quality);
        let mut config = webp::WebPConfig::new()
            .map_err(|_| ConvertError::internal_panic("failed to create WebPConfig"))?;
        config.quality = settings.webp_quality();
        config.method = 4;
        config.pass = 1;
        config.sns_strength = settings.webp_sns_strength();
        config.autofilter = 1;
        config.filter_strength = settings.webp_filter_strength();

        let (w, h) = (img.width(), img.height());
        let encoded = if img.color().has_alpha() {
            let rgba = img.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), w, h)
                .encode_advanced(&config)
                .map(|mem| mem.to_vec())
        } else {
            let rgb: Cow<'_, image::RgbImage> = match img {
                DynamicImage::ImageRgb8(rgb_img) => Cow::Borrowed(rgb_img),
                _ => Cow::Owned(img.to_rgb8()),
            };
            webp::Encoder::from_rgb(rgb.as_raw(), w, h)
                .encode_advanced(&config)
                .map(|mem| mem.to_vec())
        };

        encoded
            .map_err(|e| ConvertError::encode_failed("webp", format!("WebP encode failed: {e:?}")))
    })
}

/// Encode to a single-frame GIF (palette quantized by the image crate)
pub fn encode_gif(img: &DynamicImage) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:gif", || {
        validate_surface(img, OutputFormat::Gif)?;
        let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
        let mut buf = Vec::new();
        rgba.write_to(&mut Cursor::new(&mut buf), ImageFormat::Gif)
            .map_err(|e| ConvertError::encode_failed("gif", format!("GIF encode failed: {e}")))?;
        Ok(buf)
    })
}

/// Encode to 24-bit BMP
pub fn encode_bmp(img: &DynamicImage) -> EncoderResult<Vec<u8>> {
    run_with_panic_policy("encode:bmp", || {
        validate_surface(img, OutputFormat::Bmp)?;
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut buf = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Bmp)
            .map_err(|e| ConvertError::encode_failed("bmp", format!("BMP encode failed: {e}")))?;
        Ok(buf)
    })
}
