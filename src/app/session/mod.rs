// Session loop - Drives the screen controller from text commands
//
// The loop is the UI thread: it reads one command at a time and, between
// commands, applies the results that jobs and players post back.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::controller::ScreenController;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::format_clock;
use crate::error::{CutframeError, CutframeResult};

const HELP: &str = "\
Commands:
  videos              list videos in the source folders
  pick [index|path]   select a video (no argument lists the choices)
  info                show the selected video and trim bounds
  trim-panel          show or hide the trim panel
  start <0-100>       move the start slider
  end <0-100>         move the end slider
  trim                cut the video to the slider range
  filter [0-3|name]   apply a filter (no argument lists the filters)
  save                export the current video to the gallery
  cancel              stop the running operation
  status              show the session phase
  help                show this help
  quit                leave the session";

/// One parsed session command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Videos,
    Pick(Option<String>),
    Info,
    TrimPanel,
    Start(SliderPosition),
    End(SliderPosition),
    Trim,
    Filter(Option<FilterKind>),
    Save,
    Cancel,
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse a command line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, DomainError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let argument = (!rest.is_empty()).then(|| rest.to_string());

        let command = match name.to_lowercase().as_str() {
            "videos" | "ls" => Command::Videos,
            "pick" | "open" => Command::Pick(argument),
            "info" => Command::Info,
            "trim-panel" | "panel" => Command::TrimPanel,
            "start" => Command::Start(Self::position(name, argument)?),
            "end" => Command::End(Self::position(name, argument)?),
            "trim" => Command::Trim,
            "filter" => Command::Filter(argument.as_deref().map(FilterKind::parse).transpose()?),
            "save" => Command::Save,
            "cancel" => Command::Cancel,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => {
                return Err(DomainError::BadArgs(format!(
                    "Unknown command: {}. Type 'help' for the list",
                    other
                )))
            }
        };
        Ok(Some(command))
    }

    fn position(name: &str, argument: Option<String>) -> Result<SliderPosition, DomainError> {
        let value = argument
            .ok_or_else(|| DomainError::BadArgs(format!("Usage: {} <0-100>", name)))?;
        let value = value
            .parse::<u8>()
            .map_err(|_| DomainError::BadArgs(format!("Slider position must be 0-100, got {}", value)))?;
        SliderPosition::new(value)
    }
}

/// Whether the loop keeps reading commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive or scripted editing session
pub struct Session<W: Write> {
    controller: ScreenController,
    events: UnboundedReceiver<UiEvent>,
    out: W,
}

impl<W: Write> Session<W> {
    pub fn new(controller: ScreenController, events: UnboundedReceiver<UiEvent>, out: W) -> Self {
        Self {
            controller,
            events,
            out,
        }
    }

    pub fn controller(&self) -> &ScreenController {
        &self.controller
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Read commands until `quit` or end of input
    pub async fn run<R>(&mut self, input: R) -> CutframeResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        writeln!(self.out, "Type 'help' for commands.")?;
        self.prompt()?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match Command::parse(&line) {
                        Ok(None) => {}
                        Ok(Some(command)) => {
                            if self.execute(command).await? == Flow::Quit {
                                break;
                            }
                        }
                        Err(e) => writeln!(self.out, "{}", e)?,
                    }
                    self.prompt()?;
                }
                Some(event) = self.events.recv() => {
                    self.controller.handle_event(event).await;
                }
            }
        }

        self.shutdown().await
    }

    /// Run commands in order, waiting for each to finish. Stops at the first failure.
    pub async fn run_script(&mut self, commands: Vec<Command>) -> CutframeResult<()> {
        for command in commands {
            tracing::debug!("Script step: {:?}", command);
            self.execute(command).await?;
            self.settle().await?;
            if let Some(message) = self.controller.take_failure() {
                self.shutdown().await?;
                return Err(CutframeError::SessionError { message });
            }
        }
        self.shutdown().await
    }

    /// Apply events until no job or player preparation is outstanding
    pub async fn settle(&mut self) -> CutframeResult<()> {
        while self.controller.is_settling() {
            let event = self.events.recv().await.ok_or_else(|| CutframeError::SessionError {
                message: "Event channel closed".to_string(),
            })?;
            self.controller.handle_event(event).await;
        }
        Ok(())
    }

    /// Cancel outstanding work and wait for it to clean up
    async fn shutdown(&mut self) -> CutframeResult<()> {
        self.controller.teardown();
        self.settle().await
    }

    pub async fn execute(&mut self, command: Command) -> CutframeResult<Flow> {
        match command {
            Command::Videos => self.list_videos().await?,
            Command::Pick(None) => {
                self.list_videos().await?;
                writeln!(self.out, "Use 'pick <index>' or 'pick <path>' to select one.")?;
            }
            Command::Pick(query) => self.controller.pick(query).await,
            Command::Info => self.print_info()?,
            Command::TrimPanel => {
                let visible = self.controller.toggle_trim_panel();
                writeln!(self.out, "Trim panel {}", if visible { "shown" } else { "hidden" })?;
                if visible {
                    self.print_bounds()?;
                }
            }
            Command::Start(position) => {
                self.controller.update_trim_bound(TrimBound::Start, position);
                self.print_bounds()?;
            }
            Command::End(position) => {
                self.controller.update_trim_bound(TrimBound::End, position);
                self.print_bounds()?;
            }
            Command::Trim => self.controller.apply_trim().await,
            Command::Filter(None) => {
                writeln!(self.out, "Filters:")?;
                for (index, filter) in FilterKind::ALL.iter().enumerate() {
                    writeln!(self.out, "  {}  {}", index, filter)?;
                }
            }
            Command::Filter(Some(filter)) => self.controller.apply_filter(filter).await,
            Command::Save => self.controller.save().await,
            Command::Cancel => {
                self.controller.cancel();
            }
            Command::Status => self.print_status()?,
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
        }
        self.out.flush()?;
        Ok(Flow::Continue)
    }

    fn prompt(&mut self) -> CutframeResult<()> {
        write!(self.out, "cutframe> ")?;
        self.out.flush()?;
        Ok(())
    }

    async fn list_videos(&mut self) -> CutframeResult<()> {
        let videos = self.controller.browse().await;
        if videos.is_empty() {
            writeln!(self.out, "No videos found in the source folders")?;
        }
        for (index, video) in videos.iter().enumerate() {
            writeln!(self.out, "  [{}] {}  ({})", index, video.display_name(), video.to_file_path().display())?;
        }
        Ok(())
    }

    fn print_bounds(&mut self) -> CutframeResult<()> {
        let (start, end) = self.controller.labels();
        writeln!(self.out, "Start {}  End {}", start, end)?;
        Ok(())
    }

    fn print_info(&mut self) -> CutframeResult<()> {
        let state = self.controller.state();
        match &state.source {
            None => writeln!(self.out, "No video selected")?,
            Some(source) => {
                writeln!(self.out, "Video:    {}", source)?;
                let duration = if state.duration_ms > 0 {
                    format_clock(state.duration_ms)
                } else {
                    "unknown".to_string()
                };
                writeln!(self.out, "Duration: {}", duration)?;
                writeln!(
                    self.out,
                    "Trim:     {} - {} (sliders {} / {})",
                    state.start_label, state.end_label, state.start_position, state.end_position
                )?;
            }
        }
        Ok(())
    }

    fn print_status(&mut self) -> CutframeResult<()> {
        let state = self.controller.state();
        let phase = match state.phase {
            SessionPhase::Empty => "empty",
            SessionPhase::HasSource => "has source",
            SessionPhase::Previewing => "previewing",
            SessionPhase::Exporting => "exporting",
        };
        writeln!(self.out, "Phase: {}", phase)?;
        if let Some(kind) = state.active_job {
            writeln!(self.out, "Running: {}", kind)?;
        }
        writeln!(self.out, "Playback: {:?}", self.controller.playback_status())?;
        Ok(())
    }
}
