// src/engine.rs
//
// The conversion engine. One source image goes through
// decode -> resolve geometry -> render surface -> encode,
// with the blocking codec work kept off the caller's async task.
//
// This file is a facade over the modules in engine/

// =============================================================================
// SECURITY LIMITS
// =============================================================================

/// Maximum allowed image dimension (width or height), for sources and outputs.
pub const MAX_DIMENSION: u32 = 32768;

/// Maximum allowed total pixels (width * height).
/// 100 megapixels = 400MB uncompressed RGBA.
pub const MAX_PIXELS: u64 = 100_000_000;

// =============================================================================
// MODULE DECOMPOSITION
// =============================================================================

mod common;
mod decoder;
mod encoder;
mod io;
mod limits;
mod pipeline;
mod pool;
mod tasks;

pub use decoder::{check_dimensions, decode_image, detect_format};
pub use encoder::{
    encode, encode_bmp, encode_gif, encode_jpeg, encode_png, encode_webp, QualitySettings,
};
pub use io::{format_size, ConvertedImage, SourceImage};
pub use limits::{LimitPolicy, Limits};
pub use pipeline::{flatten_onto_white, render_surface, resolve_dimensions};
pub use pool::{install as install_in_pool, optimal_concurrency, MAX_CONCURRENCY};
pub use tasks::{convert, ConvertTask, OutputNamer};
