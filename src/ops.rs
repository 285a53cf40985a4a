// src/ops.rs
//
// Format policy and conversion requests.
// These are cheap to create and copy - the expensive work happens in the engine.

use crate::error::{ConvertError, Result};

/// MIME types accepted as input. Anything else is filtered out on add.
pub const SUPPORTED_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/bmp",
];

/// Whether a MIME type is on the input whitelist (exact match).
pub fn is_supported(mime: &str) -> bool {
    SUPPORTED_MIME_TYPES.contains(&mime)
}

/// Output format for encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
    Gif,
    Bmp,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::WebP,
        OutputFormat::Gif,
        OutputFormat::Bmp,
    ];

    /// Parse a MIME type (`image/webp`) or a short name (`webp`, `jpg`).
    pub fn parse(format: &str) -> Result<Self> {
        let lowered = format.trim().to_ascii_lowercase();
        let name = lowered.strip_prefix("image/").unwrap_or(&lowered);
        match name {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::WebP),
            "gif" => Ok(Self::Gif),
            "bmp" => Ok(Self::Bmp),
            _ => Err(ConvertError::unsupported_format(format.to_string())),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }

    /// Canonical file extension. JPEG maps to "jpg", not "jpeg".
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    /// Opaque-only formats get a white background before drawing.
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, Self::Jpeg | Self::Bmp)
    }

    /// Whether the quality factor has any effect. Quality controls are
    /// hidden for the other formats and the value is ignored.
    pub fn uses_quality(&self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP)
    }

    /// Text for the convert button, e.g. "Convert All to WEBP".
    pub fn action_label(&self) -> String {
        format!("Convert All to {}", self.as_str().to_ascii_uppercase())
    }
}

/// Free-function form of [`OutputFormat::extension`].
pub fn extension_for(format: OutputFormat) -> &'static str {
    format.extension()
}

/// How output files are named.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamingPolicy {
    /// Original base name with the target extension
    KeepOriginal,
    /// `image_<batch-stamp>_<n>.<ext>`
    Synthetic,
}

/// One batch worth of conversion parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionRequest {
    pub format: OutputFormat,
    /// 0.0..=1.0, only used by lossy formats
    pub quality: f32,
    /// 0 = unconstrained
    pub target_width: u32,
    /// 0 = unconstrained
    pub target_height: u32,
    pub preserve_aspect: bool,
    pub naming: NamingPolicy,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 0.9,
            target_width: 0,
            target_height: 0,
            preserve_aspect: true,
            naming: NamingPolicy::KeepOriginal,
        }
    }
}

impl ConversionRequest {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.target_width = width;
        self.target_height = height;
        self
    }

    pub fn with_preserve_aspect(mut self, preserve: bool) -> Self {
        self.preserve_aspect = preserve;
        self
    }

    pub fn with_naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    /// Quality is only checked for formats that use it; lossless formats ignore it.
    pub fn validate(&self) -> Result<()> {
        if self.format.uses_quality() && !(0.0..=1.0).contains(&self.quality) {
            return Err(ConvertError::invalid_argument(
                "quality",
                self.quality.to_string(),
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }

    /// Quality as an encoder percentage (0-100).
    pub fn quality_percent(&self) -> u8 {
        quality_percent(self.quality)
    }
}

fn quality_percent(quality: f32) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Slider label, e.g. "(90%) - High".
pub fn quality_label(quality: f32) -> String {
    let pct = quality_percent(quality);
    let label = if pct < 50 {
        "Low"
    } else if pct < 80 {
        "Medium"
    } else {
        "High"
    };
    format!("({pct}%) - {label}")
}

// =============================================================================
// PRESETS - Common request configurations
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestPreset {
    /// 150x150 box, WebP quality 0.75
    Thumbnail,
    /// 1920 wide, JPEG quality 0.85
    Web,
    /// Original size, PNG
    Lossless,
}

impl RequestPreset {
    pub fn get(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "thumbnail" => Ok(Self::Thumbnail),
            "web" => Ok(Self::Web),
            "lossless" => Ok(Self::Lossless),
            _ => Err(ConvertError::invalid_argument(
                "preset",
                name.to_string(),
                "expected thumbnail, web or lossless",
            )),
        }
    }

    pub fn request(&self) -> ConversionRequest {
        match self {
            Self::Thumbnail => ConversionRequest::new(OutputFormat::WebP)
                .with_quality(0.75)
                .with_size(150, 150),
            Self::Web => ConversionRequest::new(OutputFormat::Jpeg)
                .with_quality(0.85)
                .with_size(1920, 0),
            Self::Lossless => ConversionRequest::new(OutputFormat::Png),
        }
    }
}
