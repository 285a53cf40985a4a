// src/archive.rs
//
// Bundles converted images into one zip container.

use crate::engine::ConvertedImage;
use crate::error::{ConvertError, Result};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// File name offered for the batch download.
pub const ARCHIVE_NAME: &str = "images.zip";

/// Write every result as a top-level entry named after it.
///
/// When two results share a name the later one wins and the earlier entry is
/// left out. An empty input produces a valid, empty archive.
pub fn archive<'a>(results: impl IntoIterator<Item = &'a ConvertedImage>) -> Result<Vec<u8>> {
    let results: Vec<&ConvertedImage> = results.into_iter().collect();

    let mut last_index: HashMap<&str, usize> = HashMap::with_capacity(results.len());
    for (i, image) in results.iter().enumerate() {
        last_index.insert(image.name(), i);
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for (i, image) in results.iter().enumerate() {
        if last_index.get(image.name()) != Some(&i) {
            tracing::debug!(name = image.name(), "dropping shadowed archive entry");
            continue;
        }
        zip.start_file(image.name(), options)?;
        zip.write_all(image.bytes())
            .map_err(|e| ConvertError::archive_failed(format!("writing '{}': {e}", image.name())))?;
    }

    Ok(zip.finish()?.into_inner())
}

/// [`archive`] on the blocking pool.
pub async fn archive_async(results: Vec<ConvertedImage>) -> Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || archive(&results))
        .await
        .map_err(|e| ConvertError::internal_panic(format!("archive worker failed: {e}")))?
}
