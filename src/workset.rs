// src/workset.rs
//
// The working set: accepted sources paired 1:1 with their optional conversion
// results. Each entry is a single Slot, so sources and results can never drift
// apart on add/remove/clear.

use crate::archive::{self, ARCHIVE_NAME};
use crate::engine::{ConvertedImage, SourceImage};
use crate::error::{ConvertError, Result};
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub source: SourceImage,
    pub converted: Option<ConvertedImage>,
}

impl Slot {
    fn new(source: SourceImage) -> Self {
        Self {
            source,
            converted: None,
        }
    }
}

/// Outcome of an add call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddOutcome {
    pub accepted: usize,
    /// Names of files dropped by the MIME whitelist
    pub rejected: Vec<String>,
}

/// A named buffer ready to be saved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Download<'a> {
    pub name: &'a str,
    pub bytes: &'a [u8],
}

/// An owned named buffer (the batch archive).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveDownload {
    pub name: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkingSet {
    slots: Vec<Slot>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the whitelisted files, silently dropping the rest.
    ///
    /// Returns `NoSupportedFiles` when the input was non-empty but nothing was
    /// accepted; the set is left unchanged in that case.
    pub fn add(&mut self, files: impl IntoIterator<Item = SourceImage>) -> Result<AddOutcome> {
        let mut outcome = AddOutcome::default();
        let mut accepted = Vec::new();
        for file in files {
            if file.is_supported() {
                accepted.push(Slot::new(file));
            } else {
                debug!(name = file.name(), mime = file.mime(), "skipping unsupported file");
                outcome.rejected.push(file.name().to_string());
            }
        }

        if accepted.is_empty() && !outcome.rejected.is_empty() {
            return Err(ConvertError::no_supported_files());
        }

        outcome.accepted = accepted.len();
        self.slots.extend(accepted);
        Ok(outcome)
    }

    /// Remove the entry at `index`; later entries shift down by one.
    pub fn remove(&mut self, index: usize) -> Result<SourceImage> {
        if index >= self.slots.len() {
            return Err(ConvertError::index_out_of_range(index, self.slots.len()));
        }
        Ok(self.slots.remove(index).source)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn source(&self, index: usize) -> Option<&SourceImage> {
        self.slots.get(index).map(|slot| &slot.source)
    }

    pub fn converted(&self, index: usize) -> Option<&ConvertedImage> {
        self.slots.get(index).and_then(|slot| slot.converted.as_ref())
    }

    pub fn converted_count(&self) -> usize {
        self.slots.iter().filter(|s| s.converted.is_some()).count()
    }

    pub fn has_converted(&self) -> bool {
        self.slots.iter().any(|s| s.converted.is_some())
    }

    /// Present results in index order; absent slots are skipped.
    pub fn converted_images(&self) -> impl Iterator<Item = &ConvertedImage> {
        self.slots.iter().filter_map(|slot| slot.converted.as_ref())
    }

    pub(crate) fn set_converted(&mut self, index: usize, converted: Option<ConvertedImage>) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.converted = converted;
        }
    }

    /// "1 image" / "3 images"
    pub fn counter_text(&self) -> String {
        let n = self.slots.len();
        format!("{n} image{}", if n == 1 { "" } else { "s" })
    }

    /// Single-file download; None when the slot is missing or not converted.
    pub fn download(&self, index: usize) -> Option<Download<'_>> {
        self.converted(index).map(|c| Download {
            name: c.name(),
            bytes: c.bytes(),
        })
    }

    /// The batch archive; None when nothing has been converted.
    pub fn download_all(&self) -> Result<Option<ArchiveDownload>> {
        if !self.has_converted() {
            return Ok(None);
        }
        let bytes = archive::archive(self.converted_images())?;
        info!(entries = self.converted_count(), bytes = bytes.len(), "built archive");
        Ok(Some(ArchiveDownload {
            name: ARCHIVE_NAME,
            bytes,
        }))
    }

    /// Async form of [`WorkingSet::download_all`]; zipping runs on the blocking pool.
    pub async fn download_all_async(&self) -> Result<Option<ArchiveDownload>> {
        if !self.has_converted() {
            return Ok(None);
        }
        let images: Vec<ConvertedImage> = self.converted_images().cloned().collect();
        let bytes = archive::archive_async(images).await?;
        Ok(Some(ArchiveDownload {
            name: ARCHIVE_NAME,
            bytes,
        }))
    }
}
