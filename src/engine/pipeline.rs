// src/engine/pipeline.rs
//
// Geometry resolution and raster surface rendering.

use crate::ops::OutputFormat;
use image::{imageops::FilterType, DynamicImage, Rgb, RgbImage};
use std::borrow::Cow;

/// Resampling filter used for every resize.
const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Compute output dimensions for a source of `orig_w` x `orig_h`.
///
/// A target of 0 means "no constraint on this axis".
/// - both targets 0: original size
/// - `preserve_aspect` with both targets: fit inside the box (never fill)
/// - `preserve_aspect` with one target: that axis matches, the other scales
/// - no `preserve_aspect`: each non-zero target replaces its axis directly
///
/// Results are rounded and never below 1 pixel.
pub fn resolve_dimensions(
    orig_w: u32,
    orig_h: u32,
    target_w: u32,
    target_h: u32,
    preserve_aspect: bool,
) -> (u32, u32) {
    if (target_w == 0 && target_h == 0) || orig_w == 0 || orig_h == 0 {
        return (orig_w, orig_h);
    }

    if !preserve_aspect {
        let w = if target_w > 0 { target_w } else { orig_w };
        let h = if target_h > 0 { target_h } else { orig_h };
        return (w, h);
    }

    let scaled = |len: u32, ratio: f64| ((len as f64 * ratio).round() as u32).max(1);

    match (target_w, target_h) {
        (w, 0) => (w, scaled(orig_h, w as f64 / orig_w as f64)),
        (0, h) => (scaled(orig_w, h as f64 / orig_h as f64), h),
        (w, h) => {
            let scale_w = w as f64 / orig_w as f64;
            let scale_h = h as f64 / orig_h as f64;
            // The limiting axis takes its target exactly so float error cannot overshoot
            if scale_w <= scale_h {
                (w, scaled(orig_h, scale_w).min(h))
            } else {
                (scaled(orig_w, scale_h).min(w), h)
            }
        }
    }
}

/// Fill transparent regions with opaque white, as if the image were drawn
/// onto a white surface. Output is always RGB8.
pub fn flatten_onto_white(img: &DynamicImage) -> DynamicImage {
    if !img.color().has_alpha() {
        return DynamicImage::ImageRgb8(img.to_rgb8());
    }
    let rgba = img.to_rgba8();
    let flattened = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    });
    DynamicImage::ImageRgb8(flattened)
}

/// Draw `img` onto an off-screen surface of `width` x `height` for `format`.
///
/// Opaque-only formats get the white background first; formats with alpha keep
/// transparency. The source is only copied when something actually changes.
pub fn render_surface<'a>(
    img: &'a DynamicImage,
    width: u32,
    height: u32,
    format: OutputFormat,
) -> Cow<'a, DynamicImage> {
    let background: Cow<'a, DynamicImage> = if format.supports_alpha() {
        Cow::Borrowed(img)
    } else {
        Cow::Owned(flatten_onto_white(img))
    };

    if background.width() == width && background.height() == height {
        return background;
    }

    tracing::debug!(
        from_w = background.width(),
        from_h = background.height(),
        to_w = width,
        to_h = height,
        "resizing surface"
    );
    Cow::Owned(background.resize_exact(width, height, RESIZE_FILTER))
}
