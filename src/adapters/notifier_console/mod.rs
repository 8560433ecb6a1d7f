// Console notifier adapter - Prints transient user messages to the terminal

use std::io::Write;
use std::sync::Mutex;

use crate::domain::model::*;
use crate::ports::*;

/// Writes each notice as one line, prefixed by its severity
pub struct ConsoleNotifierAdapter<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleNotifierAdapter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleNotifierAdapter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Render a notice the way it appears on screen
    pub fn render(notice: &Notice) -> String {
        let tag = match notice.level {
            NoticeLevel::Info => "[info]",
            NoticeLevel::Error => "[error]",
        };
        format!("{} {}", tag, notice.message)
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> NotifierPort for ConsoleNotifierAdapter<W> {
    fn notify(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, "notice: {}", notice.message);
        if let Ok(mut out) = self.out.lock() {
            // A closed terminal is not worth failing the operation over
            let _ = writeln!(out, "{}", Self::render(&notice));
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_are_written_one_per_line() {
        let notifier = ConsoleNotifierAdapter::new(Vec::new());
        notifier.notify(Notice::info("Trimming video..."));
        notifier.notify(Notice::error("Select a video first"));

        let text = String::from_utf8(notifier.into_inner()).unwrap();
        assert_eq!(
            text,
            "[info] Trimming video...\n[error] Select a video first\n"
        );
    }
}
