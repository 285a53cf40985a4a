// src/engine/tasks.rs
//
// The per-image conversion pipeline:
// decode -> resolve geometry -> render surface -> encode -> name.
// The blocking work runs on tokio's blocking pool so callers only await.

use crate::engine::decoder::{check_dimensions, decode_image};
use crate::engine::encoder::encode;
use crate::engine::io::{ConvertedImage, SourceImage};
use crate::engine::limits::Limits;
use crate::engine::pipeline::{render_surface, resolve_dimensions};
use crate::error::{ConvertError, Result};
use crate::ops::{ConversionRequest, NamingPolicy};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Produces output file names for one batch run.
///
/// Synthetic names combine a per-batch stamp with the item's 1-based position,
/// so two files converted within the same millisecond never collide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputNamer {
    stamp: u128,
}

impl OutputNamer {
    pub fn new() -> Self {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self { stamp }
    }

    pub fn with_stamp(stamp: u128) -> Self {
        Self { stamp }
    }

    pub fn name_for(&self, source: &SourceImage, index: usize, request: &ConversionRequest) -> String {
        let ext = request.format.extension();
        match request.naming {
            NamingPolicy::KeepOriginal => format!("{}.{ext}", source.base_name()),
            NamingPolicy::Synthetic => format!("image_{}_{}.{ext}", self.stamp, index + 1),
        }
    }
}

impl Default for OutputNamer {
    fn default() -> Self {
        Self::new()
    }
}

/// One image's worth of conversion work.
#[derive(Clone, Debug)]
pub struct ConvertTask {
    pub source: SourceImage,
    pub request: ConversionRequest,
    pub output_name: String,
    pub limits: Limits,
}

impl ConvertTask {
    pub fn new(source: SourceImage, request: ConversionRequest, output_name: String) -> Self {
        Self {
            source,
            request,
            output_name,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Run the whole pipeline on the current thread.
    pub fn process(&self) -> Result<ConvertedImage> {
        let name = self.source.name();
        let bytes = self.source.bytes();
        let start = Instant::now();

        self.limits.enforce_source_len(name, bytes.len())?;

        // 1. Decode
        let (img, detected) = decode_image(name, bytes)?;
        let (orig_w, orig_h) = (img.width(), img.height());
        self.limits.enforce_pixels(orig_w, orig_h)?;
        let decoded_at = start.elapsed();

        // 2. Geometry
        let (out_w, out_h) = resolve_dimensions(
            orig_w,
            orig_h,
            self.request.target_width,
            self.request.target_height,
            self.request.preserve_aspect,
        );
        check_dimensions(out_w, out_h)?;
        self.limits.enforce_pixels(out_w, out_h)?;

        // 3. Surface (background fill + resample)
        let surface = render_surface(&img, out_w, out_h, self.request.format);

        // 4. Encode
        let encoded = encode(&surface, self.request.format, self.request.quality_percent())?;

        debug!(
            source = name,
            input_format = ?detected,
            output = %self.output_name,
            from = ?(orig_w, orig_h),
            to = ?(out_w, out_h),
            decode_ms = decoded_at.as_secs_f64() * 1000.0,
            total_ms = start.elapsed().as_secs_f64() * 1000.0,
            bytes_in = bytes.len(),
            bytes_out = encoded.len(),
            "converted image"
        );

        Ok(ConvertedImage::new(
            self.output_name.clone(),
            encoded,
            self.source.len(),
            (out_w, out_h),
        ))
    }

    /// Run the pipeline on the blocking pool, bounded by the item timeout.
    ///
    /// On timeout the worker thread is abandoned; its result is discarded.
    pub async fn run(self) -> Result<ConvertedImage> {
        let name = self.source.name().to_string();
        let timeout = self.limits.timeout();
        let handle = tokio::task::spawn_blocking(move || self.process());

        let joined = match timeout {
            Some(limit) => tokio::time::timeout(limit, handle).await.map_err(|_| {
                ConvertError::timeout(name.clone(), "convert", limit.as_millis() as u64)
            })?,
            None => handle.await,
        };

        joined.map_err(|e| {
            ConvertError::internal_panic(format!("conversion worker for '{name}' failed: {e}"))
        })?
    }
}

/// Convert one source with default limits and a fresh name.
pub async fn convert(source: &SourceImage, request: &ConversionRequest) -> Result<ConvertedImage> {
    request.validate()?;
    let output_name = OutputNamer::new().name_for(source, 0, request);
    ConvertTask::new(source.clone(), request.clone(), output_name)
        .run()
        .await
}
