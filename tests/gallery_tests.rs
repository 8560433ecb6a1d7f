use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use cutframe::adapters::{FsGalleryAdapter, FsPrivateStorageAdapter};
use cutframe::app::save_interactor::{PendingEntry, SaveInteractor};
use cutframe::domain::model::*;
use cutframe::ports::*;
use tempfile::TempDir;

fn meta(name: &str) -> GalleryEntryMeta {
    GalleryEntryMeta {
        display_name: name.to_string(),
        mime_type: VIDEO_MP4_MIME.to_string(),
        relative_path: "Movies/VideoEditor".to_string(),
    }
}

#[test]
fn test_save_round_trip_through_filesystem() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("working.mp4");
    std::fs::write(&source, vec![1u8; 4096]).unwrap();

    let gallery = Arc::new(FsGalleryAdapter::new(dir.path().join("gallery")));
    let interactor = SaveInteractor::new(
        Arc::new(FsPrivateStorageAdapter::new(dir.path().join("private"))),
        gallery.clone(),
        "Movies/VideoEditor".to_string(),
    );

    let first = interactor
        .execute(&ContentRef::from_path(&source), &Arc::new(AtomicBool::new(false)))
        .unwrap();

    let visible = gallery.list_visible().unwrap();
    assert_eq!(visible, vec![first.clone()]);
    let published = gallery.content_path(&first);
    assert!(published.starts_with(dir.path().join("gallery/Movies/VideoEditor")));
    assert_eq!(std::fs::read(published).unwrap().len(), 4096);

    // Rows survive a new adapter over the same root
    let reopened = FsGalleryAdapter::new(dir.path().join("gallery"));
    assert_eq!(reopened.list_visible().unwrap().len(), 1);
}

#[test]
fn test_pending_entry_removed_on_early_drop() {
    let dir = TempDir::new().unwrap();
    let gallery = FsGalleryAdapter::new(dir.path().to_path_buf());

    let id = {
        let pending = PendingEntry::insert(&gallery, &meta("VideoEditado_1.mp4")).unwrap();
        gallery
            .open_output(pending.id())
            .unwrap()
            .write_all(b"partial")
            .unwrap();
        pending.id().to_string()
    };

    assert!(gallery.open_output(&id).is_err());
    assert!(gallery.list_visible().unwrap().is_empty());
    assert!(!dir
        .path()
        .join("Movies/VideoEditor/.pending-VideoEditado_1.mp4")
        .exists());
}

#[test]
fn test_pending_entry_removed_when_unwinding() {
    let dir = TempDir::new().unwrap();
    let gallery = FsGalleryAdapter::new(dir.path().to_path_buf());
    let mut inserted = None;

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let pending = PendingEntry::insert(&gallery, &meta("VideoEditado_2.mp4")).unwrap();
        inserted = Some(pending.id().to_string());
        panic!("copy interrupted");
    }));

    assert!(result.is_err());
    let id = inserted.unwrap();
    assert!(gallery.finalize(&id).is_err());
    assert!(gallery.list_visible().unwrap().is_empty());
}

#[test]
fn test_finalized_entry_is_kept() {
    let dir = TempDir::new().unwrap();
    let gallery = FsGalleryAdapter::new(dir.path().to_path_buf());

    let pending = PendingEntry::insert(&gallery, &meta("VideoEditado_3.mp4")).unwrap();
    gallery
        .open_output(pending.id())
        .unwrap()
        .write_all(b"complete")
        .unwrap();
    let entry = pending.finalize().unwrap();

    assert_eq!(gallery.list_visible().unwrap(), vec![entry]);
}
