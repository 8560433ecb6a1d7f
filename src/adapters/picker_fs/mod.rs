// Filesystem picker adapter - Video selection from configured media folders

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use walkdir::WalkDir;

/// How deep below each source folder the browse listing looks
const MAX_BROWSE_DEPTH: usize = 4;

/// Picks videos by path or by index into the last browse listing
pub struct FsPickerAdapter {
    source_dirs: Vec<PathBuf>,
    supported_formats: Vec<String>,
    last_listing: Mutex<Vec<ContentRef>>,
}

impl FsPickerAdapter {
    /// Create new picker browsing `source_dirs`
    pub fn new(source_dirs: Vec<PathBuf>) -> Self {
        let supported_formats = ["mp4", "mkv", "mov", "avi", "webm", "ts", "mts", "m2ts", "3gp"]
            .iter()
            .map(|ext| ext.to_string())
            .collect();

        Self {
            source_dirs,
            supported_formats,
            last_listing: Mutex::new(Vec::new()),
        }
    }

    /// Check if the path has a video extension
    fn is_supported_format(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.supported_formats.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    fn scan(&self) -> Vec<ContentRef> {
        let mut found: Vec<PathBuf> = self
            .source_dirs
            .iter()
            .flat_map(|dir| {
                WalkDir::new(dir)
                    .max_depth(MAX_BROWSE_DEPTH)
                    .follow_links(true)
                    .into_iter()
                    .filter_map(|entry| entry.ok())
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| !Self::is_hidden(path) && self.is_supported_format(path))
            .collect();

        found.sort();
        found.dedup();
        found.iter().map(|path| ContentRef::from_path(path)).collect()
    }

    /// Pending gallery bytes and probe files start with a dot
    fn is_hidden(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
    }

    fn pick_by_index(&self, index: usize) -> Result<ContentRef, DomainError> {
        let mut listing = self
            .last_listing
            .lock()
            .map_err(|_| DomainError::InternalError("Picker lock poisoned".to_string()))?;
        if listing.is_empty() {
            *listing = self.scan();
        }
        listing.get(index).cloned().ok_or_else(|| {
            DomainError::BadArgs(format!(
                "No video at index {} ({} available)",
                index,
                listing.len()
            ))
        })
    }

    fn pick_by_path(&self, query: &str) -> Result<ContentRef, DomainError> {
        let reference = ContentRef::parse(query)?;
        let path = reference.to_file_path();

        if !path.is_file() {
            return Err(DomainError::FileNotFound(path.display().to_string()));
        }
        if !self.is_supported_format(&path) {
            return Err(DomainError::InvalidFormat(format!(
                "Not a supported video file: {}",
                path.display()
            )));
        }

        let resolved = path
            .canonicalize()
            .map_err(|e| DomainError::FsFail(format!("Failed to resolve path: {}", e)))?;
        Ok(ContentRef::from_path(&resolved))
    }
}

#[async_trait]
impl PickerPort for FsPickerAdapter {
    async fn browse(&self) -> Result<Vec<ContentRef>, DomainError> {
        let listing = self.scan();
        tracing::debug!("Browse found {} videos", listing.len());
        let mut last = self
            .last_listing
            .lock()
            .map_err(|_| DomainError::InternalError("Picker lock poisoned".to_string()))?;
        *last = listing.clone();
        Ok(listing)
    }

    async fn pick(&self, request: &PickRequest) -> Result<Option<ContentRef>, DomainError> {
        let query = match request.query.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(query) => query,
        };

        let picked = match query.parse::<usize>() {
            Ok(index) => self.pick_by_index(index)?,
            Err(_) => self.pick_by_path(query)?,
        };
        Ok(Some(picked))
    }
}
