// src/error.rs
//
// Unified error handling for image-batch
// Uses thiserror for simple, type-safe error handling
//
// Error Taxonomy:
// - UserError: Invalid input or request, recoverable
// - CodecError: Decode/encode/timeout failures on a single item
// - ResourceLimit: Size and dimension limits
// - InternalBug: Library bugs (should not happen)

use std::borrow::Cow;
use thiserror::Error;

/// Error taxonomy used when surfacing failures as status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCategory {
    /// Invalid input, recoverable by user
    UserError,
    /// Format/encoding issues
    CodecError,
    /// Memory/time/dimension limits
    ResourceLimit,
    /// Library bugs (should not happen)
    InternalBug,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::UserError => "UserError",
            ErrorCategory::CodecError => "CodecError",
            ErrorCategory::ResourceLimit => "ResourceLimit",
            ErrorCategory::InternalBug => "InternalBug",
        }
    }
}

/// image-batch error types
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConvertError {
    // Input filtering
    #[error("Unsupported image format: {mime}")]
    UnsupportedFormat { mime: Cow<'static, str> },

    #[error("No supported image files found")]
    NoSupportedFiles,

    // Per-item pipeline errors
    #[error("Failed to decode '{name}': {message}")]
    DecodeFailed {
        name: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("Failed to encode as {format}: {message}")]
    EncodeFailed {
        format: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    #[error("Timed out during {stage} of '{name}' after {limit_ms}ms")]
    Timeout {
        name: Cow<'static, str>,
        stage: Cow<'static, str>,
        limit_ms: u64,
    },

    // Batch-level errors
    #[error("Failed to build archive: {message}")]
    ArchiveFailed { message: Cow<'static, str> },

    #[error("Batch cancelled after {completed} of {total} images")]
    Cancelled { completed: usize, total: usize },

    #[error("Working set is empty")]
    EmptyWorkingSet,

    // Size limits
    #[error("Image dimension {dimension} exceeds maximum {max}")]
    DimensionExceedsLimit { dimension: u32, max: u32 },

    #[error("Image pixel count {pixels} exceeds maximum {max}")]
    PixelCountExceedsLimit { pixels: u64, max: u64 },

    #[error("Source '{name}' is {len} bytes, limit is {max}")]
    SourceTooLarge {
        name: Cow<'static, str>,
        len: u64,
        max: u64,
    },

    // Request errors
    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidArgument {
        name: Cow<'static, str>,
        value: Cow<'static, str>,
        reason: Cow<'static, str>,
    },

    #[error("Index {index} out of range for working set of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    // Internal Errors
    #[error("Internal error: {message}")]
    InternalPanic { message: Cow<'static, str> },
}

// Constructor Helpers
impl ConvertError {
    pub fn unsupported_format(mime: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat { mime: mime.into() }
    }

    pub fn no_supported_files() -> Self {
        Self::NoSupportedFiles
    }

    pub fn decode_failed(
        name: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::DecodeFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn encode_failed(
        format: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::EncodeFailed {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn timeout(
        name: impl Into<Cow<'static, str>>,
        stage: impl Into<Cow<'static, str>>,
        limit_ms: u64,
    ) -> Self {
        Self::Timeout {
            name: name.into(),
            stage: stage.into(),
            limit_ms,
        }
    }

    pub fn archive_failed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::ArchiveFailed {
            message: message.into(),
        }
    }

    pub fn cancelled(completed: usize, total: usize) -> Self {
        Self::Cancelled { completed, total }
    }

    pub fn dimension_exceeds_limit(dimension: u32, max: u32) -> Self {
        Self::DimensionExceedsLimit { dimension, max }
    }

    pub fn pixel_count_exceeds_limit(pixels: u64, max: u64) -> Self {
        Self::PixelCountExceedsLimit { pixels, max }
    }

    pub fn source_too_large(name: impl Into<Cow<'static, str>>, len: u64, max: u64) -> Self {
        Self::SourceTooLarge {
            name: name.into(),
            len,
            max,
        }
    }

    pub fn invalid_argument(
        name: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
        reason: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    pub fn internal_panic(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InternalPanic {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable (user can fix it)
    ///
    /// Consistent with category(): UserError and ResourceLimit are recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self.category() {
            ErrorCategory::UserError | ErrorCategory::ResourceLimit => true,
            ErrorCategory::CodecError | ErrorCategory::InternalBug => false,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedFormat { .. }
            | Self::NoSupportedFiles
            | Self::Cancelled { .. }
            | Self::EmptyWorkingSet
            | Self::InvalidArgument { .. }
            | Self::IndexOutOfRange { .. } => ErrorCategory::UserError,

            // Timeout aborts a batch exactly like a codec failure
            Self::DecodeFailed { .. } | Self::EncodeFailed { .. } | Self::Timeout { .. } => {
                ErrorCategory::CodecError
            }

            Self::DimensionExceedsLimit { .. }
            | Self::PixelCountExceedsLimit { .. }
            | Self::SourceTooLarge { .. } => ErrorCategory::ResourceLimit,

            Self::ArchiveFailed { .. } | Self::InternalPanic { .. } => ErrorCategory::InternalBug,
        }
    }

    /// True for failures tied to a single image rather than the whole batch.
    pub fn is_item_error(&self) -> bool {
        matches!(
            self,
            Self::DecodeFailed { .. }
                | Self::EncodeFailed { .. }
                | Self::Timeout { .. }
                | Self::DimensionExceedsLimit { .. }
                | Self::PixelCountExceedsLimit { .. }
                | Self::SourceTooLarge { .. }
        )
    }
}

impl From<zip::result::ZipError> for ConvertError {
    fn from(err: zip::result::ZipError) -> Self {
        ConvertError::archive_failed(err.to_string())
    }
}

// Result type alias
pub type Result<T> = std::result::Result<T, ConvertError>;
