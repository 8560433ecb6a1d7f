//! Command implementations

use std::io::Write;

use anyhow::{Context, Result};
use tracing::info;

use crate::app::container::{AppContainer, DefaultAppContainer};
use crate::app::session::{Command, Session};
use crate::cli::args::{EditArgs, GalleryArgs};
use crate::domain::model::{FilterKind, GalleryEntry, SliderPosition};

/// Execute the session command
pub async fn session(container: &DefaultAppContainer) -> Result<()> {
    info!("Starting interactive session");
    container.request_startup_permissions().await;

    let (controller, events) = container.screen_controller();
    let mut session = Session::new(controller, events, std::io::stdout());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    session.run(stdin).await.context("Session ended with an error")?;

    info!("Session finished");
    Ok(())
}

/// Build the command script for an edit run
pub fn edit_script(args: &EditArgs) -> Result<Vec<Command>> {
    let mut script = vec![Command::Pick(Some(args.input.clone()))];

    if args.start.is_some() || args.end.is_some() {
        let start = SliderPosition::new(args.start.unwrap_or(0))?;
        let end = SliderPosition::new(args.end.unwrap_or(SliderPosition::MAX))?;
        script.push(Command::Start(start));
        script.push(Command::End(end));
        script.push(Command::Trim);
    }

    if let Some(filter) = &args.filter {
        let filter = FilterKind::parse(filter)?;
        script.push(Command::Filter(Some(filter)));
    }

    if args.save {
        script.push(Command::Save);
    }

    script.push(Command::Info);
    Ok(script)
}

/// Execute the edit command
pub async fn edit(container: &DefaultAppContainer, args: EditArgs) -> Result<()> {
    info!("Starting edit of {}", args.input);
    let script = edit_script(&args)?;

    let (controller, events) = container.screen_controller();
    let mut session = Session::new(controller, events, std::io::stdout());
    session.run_script(script).await?;

    info!("Edit finished");
    Ok(())
}

/// Execute the gallery command
pub fn gallery(container: &DefaultAppContainer, args: GalleryArgs) -> Result<()> {
    let entries = container
        .gallery()
        .list_visible()
        .context("Failed to read the gallery")?;

    let mut out = std::io::stdout().lock();
    if args.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
    } else {
        write_gallery_table(&mut out, &entries)?;
    }
    Ok(())
}

fn write_gallery_table(out: &mut impl Write, entries: &[GalleryEntry]) -> Result<()> {
    if entries.is_empty() {
        writeln!(out, "No saved videos")?;
        return Ok(());
    }
    for entry in entries {
        writeln!(
            out,
            "{}  {}/{}  {} bytes  {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.meta.relative_path,
            entry.meta.display_name,
            entry.size,
            entry.meta.mime_type
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{GalleryEntryMeta, VIDEO_MP4_MIME};

    fn args(start: Option<u8>, end: Option<u8>, filter: Option<&str>, save: bool) -> EditArgs {
        EditArgs {
            input: "/videos/clip.mp4".to_string(),
            start,
            end,
            filter: filter.map(str::to_string),
            save,
        }
    }

    #[test]
    fn test_edit_script_pick_only() {
        let script = edit_script(&args(None, None, None, false)).unwrap();
        assert_eq!(
            script,
            vec![Command::Pick(Some("/videos/clip.mp4".to_string())), Command::Info]
        );
    }

    #[test]
    fn test_edit_script_full_run() {
        let script = edit_script(&args(Some(25), None, Some("1"), true)).unwrap();
        assert_eq!(
            script,
            vec![
                Command::Pick(Some("/videos/clip.mp4".to_string())),
                Command::Start(SliderPosition::new(25).unwrap()),
                Command::End(SliderPosition::FULL),
                Command::Trim,
                Command::Filter(Some(FilterKind::Grayscale)),
                Command::Save,
                Command::Info,
            ]
        );
    }

    #[test]
    fn test_edit_script_rejects_unknown_filter() {
        assert!(edit_script(&args(None, None, Some("vintage"), false)).is_err());
    }

    #[test]
    fn test_gallery_table() {
        let mut out = Vec::new();
        write_gallery_table(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No saved videos\n");

        let entry = GalleryEntry {
            id: "1".to_string(),
            meta: GalleryEntryMeta {
                display_name: "VideoEditado_1.mp4".to_string(),
                mime_type: VIDEO_MP4_MIME.to_string(),
                relative_path: "Movies/VideoEditor".to_string(),
            },
            is_pending: false,
            created_at: chrono::Utc::now(),
            size: 42,
        };
        let mut out = Vec::new();
        write_gallery_table(&mut out, &[entry]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Movies/VideoEditor/VideoEditado_1.mp4"));
        assert!(text.contains("42 bytes"));
    }
}
