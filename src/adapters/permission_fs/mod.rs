// Filesystem permission adapter - Storage access checks against real directories

use crate::domain::model::*;
use crate::ports::*;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

/// Derives read/write access from the directories the session works with
pub struct FsPermissionAdapter {
    read_roots: Vec<PathBuf>,
    write_roots: Vec<PathBuf>,
}

impl FsPermissionAdapter {
    /// `read_roots` are the browse folders, `write_roots` the gallery and app-private dirs
    pub fn new(read_roots: Vec<PathBuf>, write_roots: Vec<PathBuf>) -> Self {
        Self {
            read_roots,
            write_roots,
        }
    }

    fn can_read(dir: &Path) -> bool {
        fs::read_dir(dir).is_ok()
    }

    /// Check write access by creating and removing a probe file
    fn can_write(dir: &Path) -> bool {
        if !dir.is_dir() {
            return false;
        }
        let probe = dir.join(".cutframe_probe");
        match fs::File::create(&probe) {
            Ok(_) => {
                let _ = fs::remove_file(&probe);
                true
            }
            Err(_) => false,
        }
    }

    fn state(granted: bool) -> PermissionState {
        if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }
}

#[async_trait]
impl PermissionPort for FsPermissionAdapter {
    async fn check(&self, access: StorageAccess) -> PermissionState {
        match access {
            // Missing folders are skipped, picks then come in as explicit paths
            StorageAccess::Read => Self::state(
                self.read_roots
                    .iter()
                    .all(|d| !d.exists() || Self::can_read(d)),
            ),
            StorageAccess::Write => {
                Self::state(self.write_roots.iter().all(|d| Self::can_write(d)))
            }
        }
    }

    async fn request(&self, access: StorageAccess) -> PermissionState {
        if access == StorageAccess::Write {
            for dir in &self.write_roots {
                if let Err(e) = fs::create_dir_all(dir) {
                    tracing::warn!("Cannot create {}: {}", dir.display(), e);
                }
            }
        }
        let state = self.check(access).await;
        tracing::info!("Storage {:?} access: {:?}", access, state);
        state
    }
}
