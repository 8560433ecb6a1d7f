use std::path::Path;
use std::process::Command;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use cutframe::adapters::{EncoderSettings, LibavPlaybackAdapter, LibavTransformAdapter};
use cutframe::domain::errors::DomainError;
use cutframe::domain::model::*;
use cutframe::ports::*;
use tempfile::TempDir;

/// Generate a short test clip with the ffmpeg CLI; `false` when it is not installed
fn create_test_video(output: &Path, seconds: u32) -> bool {
    let status = Command::new("ffmpeg")
        .args([
            "-loglevel",
            "error",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={}:size=160x120:rate=25", seconds),
            "-f",
            "lavfi",
            "-i",
            &format!("sine=frequency=440:duration={}", seconds),
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-shortest",
            "-y",
        ])
        .arg(output)
        .status();
    matches!(status, Ok(s) if s.success())
}

fn request(input: &Path, output: &Path, trim: Option<TrimRange>, effects: Vec<EffectDescriptor>) -> TransformRequest {
    TransformRequest {
        job_id: 1,
        kind: if trim.is_some() { JobKind::Trim } else { JobKind::Filter },
        input: ContentRef::from_path(input),
        output_path: output.to_path_buf(),
        trim,
        effects,
        video_mime: VIDEO_MP4_MIME.to_string(),
    }
}

fn engine() -> LibavTransformAdapter {
    LibavTransformAdapter::new(EncoderSettings {
        preset: "ultrafast".to_string(),
        ..EncoderSettings::default()
    })
}

#[tokio::test]
async fn test_trim_produces_shorter_video() {
    cutframe::init().unwrap();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.mp4");
    if !create_test_video(&input, 4) {
        return; // Skip if ffmpeg CLI not available
    }
    let output = dir.path().join("trimmed_video_1.mp4");

    let report = engine()
        .transform(
            &request(&input, &output, Some(TrimRange::new(1_000, 3_000).unwrap()), vec![]),
            Arc::new(AtomicBool::new(false)),
        )
        .await
        .unwrap();

    assert_eq!(report.output_path, output);
    assert!(report.frames_written > 0);
    let duration = LibavPlaybackAdapter::probe_duration_ms(&output).unwrap();
    assert!((1_500..=2_600).contains(&duration), "duration was {}", duration);
}

#[tokio::test]
async fn test_filter_keeps_full_length() {
    cutframe::init().unwrap();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.mp4");
    if !create_test_video(&input, 2) {
        return;
    }
    let output = dir.path().join("filtered_video_1.mp4");

    let report = engine()
        .transform(
            &request(&input, &output, None, vec![EffectDescriptor::Sepia]),
            Arc::new(AtomicBool::new(false)),
        )
        .await
        .unwrap();

    assert!(report.frames_written >= 45);
    assert!(std::fs::metadata(&output).unwrap().len() > 1000);
}

#[tokio::test]
async fn test_cancelled_job_removes_partial_output() {
    cutframe::init().unwrap();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.mp4");
    if !create_test_video(&input, 2) {
        return;
    }
    let output = dir.path().join("filtered_video_2.mp4");

    let result = engine()
        .transform(
            &request(&input, &output, None, vec![EffectDescriptor::Grayscale]),
            Arc::new(AtomicBool::new(true)),
        )
        .await;

    assert_eq!(result, Err(DomainError::Cancelled));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_unreadable_input_reports_engine_error() {
    cutframe::init().unwrap();
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("broken.mp4");
    std::fs::write(&input, b"this is not a video").unwrap();
    let output = dir.path().join("out.mp4");

    let result = engine()
        .transform(
            &request(&input, &output, None, vec![]),
            Arc::new(AtomicBool::new(false)),
        )
        .await;

    assert!(matches!(result, Err(DomainError::ProcessingError(_))));
    assert!(!output.exists());
}
