// lib.rs
//
// image-batch: in-memory batch image format conversion.
//
// Sources are added to a working set, converted in order (or in parallel on
// request) to JPEG, PNG, WebP, GIF or BMP with optional resizing, and handed
// back one by one or bundled into a zip archive.
//
// Design goals:
// - Results stay positionally paired with their sources
// - Sequential batches abort on the first failing item
// - Codec work never blocks the caller's async task

pub mod archive;
pub mod batch;
pub mod engine;
pub mod error;
pub mod ops;
pub mod workset;

pub use archive::{archive, ARCHIVE_NAME};
pub use batch::{
    convert_all_parallel, BatchReport, BatchRunner, BatchState, CancelToken, ItemOutcome, Progress,
};
pub use engine::{convert, format_size, resolve_dimensions, ConvertedImage, Limits, SourceImage};
pub use error::{ConvertError, ErrorCategory, Result};
pub use ops::{quality_label, ConversionRequest, NamingPolicy, OutputFormat, RequestPreset};
pub use workset::WorkingSet;
