// src/engine/io.rs
//
// In-memory payloads: accepted source images and their converted outputs.
// Both are immutable once built; bytes are shared through Arc so handing them
// to a blocking worker or an archive writer never copies pixels.

use crate::ops;
use std::sync::Arc;

/// A user-provided image payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    name: String,
    mime: String,
    data: Arc<Vec<u8>>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            data: Arc::new(data),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_supported(&self) -> bool {
        ops::is_supported(&self.mime)
    }

    /// Upper-cased format from the MIME type, e.g. "PNG" (preview card label).
    pub fn format_label(&self) -> String {
        self.mime
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase()
    }

    /// Name without its last extension. A name without a dot is returned whole.
    pub fn base_name(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 => &self.name[..idx],
            _ => &self.name,
        }
    }
}

/// Result of converting one source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertedImage {
    name: String,
    data: Arc<Vec<u8>>,
    original_size: u64,
    width: u32,
    height: u32,
}

impl ConvertedImage {
    pub fn new(name: String, data: Vec<u8>, original_size: u64, dims: (u32, u32)) -> Self {
        Self {
            name,
            data: Arc::new(data),
            original_size,
            width: dims.0,
            height: dims.1,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn encoded_size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size reduction in whole percent; negative when the output grew.
    pub fn savings_percent(&self) -> i64 {
        if self.original_size == 0 {
            return 0;
        }
        let delta = self.original_size as f64 - self.encoded_size() as f64;
        (delta / self.original_size as f64 * 100.0).round() as i64
    }

    /// "42% reduction" or "+17% size".
    pub fn savings_text(&self) -> String {
        let savings = self.savings_percent();
        if savings > 0 {
            format!("{savings}% reduction")
        } else {
            format!("+{}% size", savings.abs())
        }
    }
}

/// Human-readable byte count with a 1024 base, e.g. "1.5 KB".
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut exp = 0;
    while exp < UNITS.len() - 1 && bytes >= 1u64 << (10 * (exp + 1)) {
        exp += 1;
    }
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exp])
}
