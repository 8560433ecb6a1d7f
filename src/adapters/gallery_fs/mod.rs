//! Filesystem-backed media collection and app-private storage
//!
//! The collection mirrors a platform media store: every entry has a metadata
//! row (`<root>/.gallery/<id>.json`) and a byte file under
//! `<root>/<relative_path>/`. While an entry is pending its bytes live in a
//! dot-file that browsers skip; finalizing renames it to the display name and
//! clears the flag in the row.

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const INDEX_DIR: &str = ".gallery";
const PENDING_PREFIX: &str = ".pending-";

/// Shared media collection rooted at a directory
pub struct FsGalleryAdapter {
    root: PathBuf,
    next_id: AtomicU64,
}

impl FsGalleryAdapter {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            next_id: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_dir(&self) -> PathBuf {
        self.root.join(INDEX_DIR)
    }

    fn row_path(&self, id: &str) -> PathBuf {
        self.index_dir().join(format!("{}.json", id))
    }

    fn folder(&self, meta: &GalleryEntryMeta) -> PathBuf {
        self.root.join(&meta.relative_path)
    }

    fn pending_path(&self, meta: &GalleryEntryMeta) -> PathBuf {
        self.folder(meta)
            .join(format!("{}{}", PENDING_PREFIX, meta.display_name))
    }

    /// Location of an entry's bytes in its current state
    pub fn content_path(&self, entry: &GalleryEntry) -> PathBuf {
        if entry.is_pending {
            self.pending_path(&entry.meta)
        } else {
            self.folder(&entry.meta).join(&entry.meta.display_name)
        }
    }

    fn allocate_id(&self) -> String {
        let seq = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", chrono::Utc::now().timestamp_millis(), seq)
    }

    fn read_row(&self, id: &str) -> Result<GalleryEntry, DomainError> {
        let path = self.row_path(id);
        let content = fs::read_to_string(&path)
            .map_err(|_| DomainError::FileNotFound(format!("Gallery entry {}", id)))?;
        serde_json::from_str(&content)
            .map_err(|e| DomainError::InvalidFormat(format!("Corrupt gallery row {}: {}", id, e)))
    }

    /// Rows are written to a temp file first so a crash never leaves half a row
    fn write_row(&self, entry: &GalleryEntry) -> Result<(), DomainError> {
        let json = serde_json::to_string_pretty(entry)
            .map_err(|e| DomainError::InternalError(format!("Serialize gallery row: {}", e)))?;
        let mut tmp = tempfile::NamedTempFile::new_in(self.index_dir())?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(self.row_path(&entry.id))
            .map_err(|e| DomainError::FsFail(format!("Failed to persist gallery row: {}", e)))?;
        Ok(())
    }

    fn validate_meta(meta: &GalleryEntryMeta) -> Result<(), DomainError> {
        let name = Path::new(&meta.display_name);
        if meta.display_name.is_empty()
            || meta.display_name.starts_with('.')
            || name.components().count() != 1
        {
            return Err(DomainError::BadArgs(format!(
                "Invalid display name: {}",
                meta.display_name
            )));
        }
        if Path::new(&meta.relative_path).is_absolute() || meta.relative_path.contains("..") {
            return Err(DomainError::BadArgs(format!(
                "Invalid relative path: {}",
                meta.relative_path
            )));
        }
        Ok(())
    }
}

impl GalleryPort for FsGalleryAdapter {
    fn insert(&self, meta: &GalleryEntryMeta) -> Result<GalleryEntry, DomainError> {
        Self::validate_meta(meta)?;
        fs::create_dir_all(self.index_dir())?;
        fs::create_dir_all(self.folder(meta))?;

        let entry = GalleryEntry {
            id: self.allocate_id(),
            meta: meta.clone(),
            is_pending: true,
            created_at: chrono::Utc::now(),
            size: 0,
        };
        self.write_row(&entry)?;
        tracing::debug!("Inserted pending gallery entry {}", entry.id);
        Ok(entry)
    }

    fn open_output(&self, id: &str) -> Result<Box<dyn Write + Send>, DomainError> {
        let entry = self.read_row(id)?;
        if !entry.is_pending {
            return Err(DomainError::BadArgs(format!(
                "Gallery entry {} is already published",
                id
            )));
        }
        let file = fs::File::create(self.pending_path(&entry.meta))?;
        Ok(Box::new(file))
    }

    fn finalize(&self, id: &str) -> Result<GalleryEntry, DomainError> {
        let mut entry = self.read_row(id)?;
        if !entry.is_pending {
            return Ok(entry);
        }

        let pending = self.pending_path(&entry.meta);
        let size = fs::metadata(&pending)
            .map_err(|e| DomainError::FsFail(format!("Pending bytes missing for {}: {}", id, e)))?
            .len();

        entry.is_pending = false;
        entry.size = size;
        fs::rename(&pending, self.content_path(&entry))?;
        self.write_row(&entry)?;
        tracing::info!("Published gallery entry {} ({} bytes)", entry.id, size);
        Ok(entry)
    }

    fn delete(&self, id: &str) -> Result<(), DomainError> {
        let entry = self.read_row(id)?;
        // A finalize that failed after the rename leaves a pending row with published bytes
        let published = self.folder(&entry.meta).join(&entry.meta.display_name);
        for bytes in [self.pending_path(&entry.meta), published] {
            if bytes.exists() {
                fs::remove_file(&bytes)?;
            }
        }
        fs::remove_file(self.row_path(id))?;
        tracing::debug!("Deleted gallery entry {}", id);
        Ok(())
    }

    fn list_visible(&self) -> Result<Vec<GalleryEntry>, DomainError> {
        let index = self.index_dir();
        if !index.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&index)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.read_row(id) {
                Ok(entry) if !entry.is_pending => entries.push(entry),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping gallery row {}: {}", id, e),
            }
        }
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(entries)
    }
}

/// App-private directory holding working files
pub struct FsPrivateStorageAdapter {
    dir: PathBuf,
}

impl FsPrivateStorageAdapter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl PrivateStoragePort for FsPrivateStorageAdapter {
    fn working_dir(&self) -> PathBuf {
        self.dir.clone()
    }

    fn import(&self, source: &ContentRef, file_name: &str) -> Result<PathBuf, DomainError> {
        let from = source.to_file_path();
        let to = self.dir.join(file_name);
        fs::create_dir_all(&self.dir)?;

        let mut input = fs::File::open(&from)
            .map_err(|e| DomainError::FsFail(format!("Cannot open {}: {}", from.display(), e)))?;
        let mut output = fs::File::create(&to)?;
        std::io::copy(&mut input, &mut output)?;
        output.sync_all()?;
        Ok(to)
    }
}
