// Tracing log adapter - Structured logging using tracing crate

use crate::ports::*;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// Output format of the global subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "pretty" | "text" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_subscriber(level: LogLevel, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_str()));

    // Logs go to stderr so notices on stdout stay readable
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Tracing log adapter
pub struct TracingLogAdapter {
    current_level: LogLevel,
}

impl TracingLogAdapter {
    /// Create new tracing log adapter filtering below `level`
    pub fn new(level: LogLevel) -> Self {
        Self {
            current_level: level,
        }
    }

    /// Check if log level should be logged
    fn should_log(&self, level: LogLevel) -> bool {
        level >= self.current_level
    }
}

#[async_trait]
impl LogPort for TracingLogAdapter {
    async fn info(&self, message: &str) {
        if self.should_log(LogLevel::Info) {
            info!("{}", message);
        }
    }

    async fn warn(&self, message: &str) {
        if self.should_log(LogLevel::Warn) {
            warn!("{}", message);
        }
    }

    async fn error(&self, message: &str) {
        if self.should_log(LogLevel::Error) {
            error!("{}", message);
        }
    }

    async fn debug(&self, message: &str) {
        if self.should_log(LogLevel::Debug) {
            debug!("{}", message);
        }
    }

    async fn log_event(&self, event: &LogEvent) {
        if !self.should_log(event.level) {
            return;
        }

        match event.level {
            LogLevel::Error => {
                tracing::error!(message = %event.message, context = ?event.context);
            }
            LogLevel::Warn => {
                tracing::warn!(message = %event.message, context = ?event.context);
            }
            LogLevel::Info => {
                tracing::info!(message = %event.message, context = ?event.context);
            }
            LogLevel::Debug => {
                tracing::debug!(message = %event.message, context = ?event.context);
            }
            LogLevel::Trace => {
                tracing::trace!(message = %event.message, context = ?event.context);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_log_respects_level() {
        let adapter = TracingLogAdapter::new(LogLevel::Warn);
        assert!(adapter.should_log(LogLevel::Error));
        assert!(adapter.should_log(LogLevel::Warn));
        assert!(!adapter.should_log(LogLevel::Info));
        assert!(!adapter.should_log(LogLevel::Debug));
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("Pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }
}
