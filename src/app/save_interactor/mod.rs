// Save interactor - Exports the current working file into the shared gallery

use std::fs::File;
use std::io::{Read, Write};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Copy buffer size; cancellation is checked once per chunk
const COPY_CHUNK: usize = 256 * 1024;

/// Pending gallery row that is deleted unless it reaches `finalize`
///
/// Covers early returns, cancellation and unwinding alike, so a half-written
/// entry never stays behind in the collection.
pub struct PendingEntry<'a> {
    gallery: &'a dyn GalleryPort,
    id: String,
    armed: bool,
}

impl<'a> PendingEntry<'a> {
    pub fn insert(gallery: &'a dyn GalleryPort, meta: &GalleryEntryMeta) -> Result<Self, DomainError> {
        let entry = gallery.insert(meta)?;
        Ok(Self {
            gallery,
            id: entry.id,
            armed: true,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Publish the entry; the guard is disarmed only once the gallery accepts it
    pub fn finalize(mut self) -> Result<GalleryEntry, DomainError> {
        let entry = self.gallery.finalize(&self.id)?;
        self.armed = false;
        Ok(entry)
    }
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.gallery.delete(&self.id) {
            Ok(()) => tracing::info!("Removed unfinished gallery entry {}", self.id),
            Err(e) => tracing::warn!("Failed to remove unfinished gallery entry {}: {}", self.id, e),
        }
    }
}

/// Interactor for the save-to-gallery use case
pub struct SaveInteractor {
    storage: Arc<dyn PrivateStoragePort>,
    gallery: Arc<dyn GalleryPort>,
    gallery_folder: String,
}

impl SaveInteractor {
    /// Create new save interactor with injected ports
    pub fn new(
        storage: Arc<dyn PrivateStoragePort>,
        gallery: Arc<dyn GalleryPort>,
        gallery_folder: String,
    ) -> Self {
        Self {
            storage,
            gallery,
            gallery_folder,
        }
    }

    /// Run the export synchronously. Blocks on file I/O.
    pub fn execute(&self, source: &ContentRef, cancel: &CancelFlag) -> Result<GalleryEntry, DomainError> {
        let millis = OutputNaming::timestamp_millis();
        Self::check_cancel(cancel)?;

        let working = self
            .storage
            .import(source, &OutputNaming::working_file_name(JobKind::Save, millis))?;
        tracing::debug!("Copied {} to {}", source, working.display());
        Self::check_cancel(cancel)?;

        let meta = GalleryEntryMeta {
            display_name: OutputNaming::gallery_display_name(millis),
            mime_type: VIDEO_MP4_MIME.to_string(),
            relative_path: self.gallery_folder.clone(),
        };
        let pending = PendingEntry::insert(self.gallery.as_ref(), &meta)?;

        {
            let mut input = File::open(&working)
                .map_err(|e| DomainError::FsFail(format!("Cannot open {}: {}", working.display(), e)))?;
            let mut output = self.gallery.open_output(pending.id())?;
            Self::copy(&mut input, &mut output, cancel)?;
            output.flush()?;
        }

        let entry = pending.finalize()?;
        tracing::info!(
            "Saved {} to gallery as {}/{}",
            source,
            entry.meta.relative_path,
            entry.meta.display_name
        );
        Ok(entry)
    }

    fn check_cancel(cancel: &CancelFlag) -> Result<(), DomainError> {
        if cancel.load(Ordering::SeqCst) {
            return Err(DomainError::Cancelled);
        }
        Ok(())
    }

    fn copy(input: &mut dyn Read, output: &mut dyn Write, cancel: &CancelFlag) -> Result<u64, DomainError> {
        let mut buffer = vec![0u8; COPY_CHUNK];
        let mut total = 0u64;
        loop {
            Self::check_cancel(cancel)?;
            let read = input.read(&mut buffer)?;
            if read == 0 {
                return Ok(total);
            }
            output.write_all(&buffer[..read])?;
            total += read as u64;
        }
    }
}
