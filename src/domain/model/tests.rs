// Unit tests for domain models

use super::*;
use std::path::Path;

#[test]
fn test_content_ref_parse_plain_path() {
    let reference = ContentRef::parse("  /videos/clip.mp4 ").unwrap();
    assert_eq!(reference.as_str(), "/videos/clip.mp4");
    assert_eq!(reference.to_file_path(), PathBuf::from("/videos/clip.mp4"));
    assert_eq!(reference.display_name(), "clip.mp4");
}

#[test]
fn test_content_ref_file_scheme_round_trip() {
    let reference = ContentRef::from_path(Path::new("/tmp/out/trimmed_video_1.mp4"));
    assert_eq!(reference.as_str(), "file:///tmp/out/trimmed_video_1.mp4");
    assert_eq!(
        reference.to_file_path(),
        PathBuf::from("/tmp/out/trimmed_video_1.mp4")
    );
}

#[test]
fn test_content_ref_rejects_empty_and_foreign_schemes() {
    assert!(matches!(ContentRef::parse("   "), Err(DomainError::BadArgs(_))));
    assert!(matches!(
        ContentRef::parse("content://media/external/video/42"),
        Err(DomainError::InvalidFormat(_))
    ));
}

#[test]
fn test_slider_position_bounds() {
    assert_eq!(SliderPosition::new(0).unwrap(), SliderPosition::ZERO);
    assert_eq!(SliderPosition::new(100).unwrap(), SliderPosition::FULL);
    assert!(SliderPosition::new(101).is_err());
}

#[test]
fn test_trim_range_requires_start_before_end() {
    let range = TrimRange::new(15_000, 45_000).unwrap();
    assert_eq!(range.duration(), Duration::from_secs(30));
    assert_eq!(range.start_seconds(), 15.0);
    assert_eq!(range.end_seconds(), 45.0);

    assert_eq!(
        TrimRange::new(5_000, 5_000),
        Err(DomainError::InvalidTimeRange {
            start_ms: 5_000,
            end_ms: 5_000
        })
    );
    assert!(TrimRange::new(6_000, 5_000).is_err());
}

#[test]
fn test_filter_menu_order() {
    assert_eq!(FilterKind::from_index(0).unwrap(), FilterKind::Sepia);
    assert_eq!(FilterKind::from_index(1).unwrap(), FilterKind::Grayscale);
    assert_eq!(FilterKind::from_index(2).unwrap(), FilterKind::HighContrast);
    assert_eq!(FilterKind::from_index(3).unwrap(), FilterKind::None);
    assert!(FilterKind::from_index(4).is_err());
}

#[test]
fn test_filter_parse_names() {
    assert_eq!(FilterKind::parse("Grayscale").unwrap(), FilterKind::Grayscale);
    assert_eq!(FilterKind::parse("high_contrast").unwrap(), FilterKind::HighContrast);
    assert_eq!(FilterKind::parse("High Contrast").unwrap(), FilterKind::HighContrast);
    assert_eq!(FilterKind::parse("2").unwrap(), FilterKind::HighContrast);
    assert!(FilterKind::parse("vintage").is_err());
}

#[test]
fn test_filter_effects() {
    assert_eq!(
        FilterKind::Grayscale.effects(2.0),
        vec![EffectDescriptor::Grayscale]
    );
    assert_eq!(FilterKind::Sepia.effects(2.0), vec![EffectDescriptor::Sepia]);
    assert_eq!(
        FilterKind::HighContrast.effects(2.0),
        vec![EffectDescriptor::Contrast { amount: 2.0 }]
    );
    assert!(FilterKind::None.effects(2.0).is_empty());
}

#[test]
fn test_gallery_entry_serializes_flat() {
    let entry = GalleryEntry {
        id: "abc".to_string(),
        meta: GalleryEntryMeta {
            display_name: "VideoEditado_1.mp4".to_string(),
            mime_type: VIDEO_MP4_MIME.to_string(),
            relative_path: "Movies/VideoEditor".to_string(),
        },
        is_pending: true,
        created_at: chrono::Utc::now(),
        size: 0,
    };

    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["mime_type"], "video/mp4");
    assert_eq!(json["is_pending"], true);

    let back: GalleryEntry = serde_json::from_value(json).unwrap();
    assert_eq!(back, entry);
}

#[test]
fn test_notice_builders() {
    let notice = Notice::info("Video saved to gallery").long();
    assert_eq!(notice.level, NoticeLevel::Info);
    assert_eq!(notice.length, NoticeLength::Long);

    let notice = Notice::error("boom");
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.length, NoticeLength::Short);
}
