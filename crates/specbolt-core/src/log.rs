//! Leveled diagnostic sink injected into emulator components.
//!
//! Components never talk to a process-wide logger. They hold a [`LogSink`]
//! handed to them at construction and report through it. The host decides
//! where messages go: [`TracingSink`] forwards to `tracing`, [`NullSink`]
//! drops everything.

use std::fmt;
use std::sync::Arc;

/// Message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that accepts a leveled text message.
///
/// Sinks must not fail. A sink that cannot deliver a message drops it.
/// Sinks travel with the component that owns them, so they must be `Send`.
pub trait LogSink: Send {
    fn log(&self, level: Level, message: &str);

    /// Returns false if messages at `level` would be discarded, so callers
    /// can skip formatting them.
    fn enabled(&self, _level: Level) -> bool {
        true
    }
}

impl<T: LogSink + ?Sized> LogSink for Box<T> {
    fn log(&self, level: Level, message: &str) {
        (**self).log(level, message);
    }

    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }
}

impl<T: LogSink + Sync + ?Sized> LogSink for Arc<T> {
    fn log(&self, level: Level, message: &str) {
        (**self).log(level, message);
    }

    fn enabled(&self, level: Level) -> bool {
        (**self).enabled(level)
    }
}

/// Forwards messages to the `tracing` subscriber installed by the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Debug => tracing::debug!(target: "specbolt", "{message}"),
            Level::Info => tracing::info!(target: "specbolt", "{message}"),
            Level::Warning => tracing::warn!(target: "specbolt", "{message}"),
            Level::Error => tracing::error!(target: "specbolt", "{message}"),
            Level::Critical => tracing::error!(target: "specbolt", critical = true, "{message}"),
        }
    }

    fn enabled(&self, level: Level) -> bool {
        match level {
            Level::Debug => tracing::enabled!(target: "specbolt", tracing::Level::DEBUG),
            Level::Info => tracing::enabled!(target: "specbolt", tracing::Level::INFO),
            Level::Warning => tracing::enabled!(target: "specbolt", tracing::Level::WARN),
            Level::Error | Level::Critical => {
                tracing::enabled!(target: "specbolt", tracing::Level::ERROR)
            }
        }
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _level: Level, _message: &str) {}

    fn enabled(&self, _level: Level) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(Level, String)>>);

    impl LogSink for Recorder {
        fn log(&self, level: Level, message: &str) {
            if let Ok(mut messages) = self.0.lock() {
                messages.push((level, message.to_owned()));
            }
        }
    }

    #[test]
    fn shared_handle_sees_messages() {
        let recorder = Arc::new(Recorder::default());
        let sink: Box<dyn LogSink> = Box::new(Arc::clone(&recorder));
        sink.log(Level::Warning, "unknown opcode");
        assert_eq!(
            recorder.0.lock().expect("lock").as_slice(),
            &[(Level::Warning, "unknown opcode".to_owned())]
        );
    }

    #[test]
    fn boxed_sink_moves_across_threads() {
        let recorder = Arc::new(Recorder::default());
        let sink: Box<dyn LogSink> = Box::new(Arc::clone(&recorder));
        thread::spawn(move || sink.log(Level::Info, "from worker"))
            .join()
            .expect("worker");
        assert_eq!(recorder.0.lock().expect("lock").len(), 1);
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Error < Level::Critical);
        assert_eq!(Level::Warning.to_string(), "WARNING");
    }

    #[test]
    fn null_sink_reports_disabled() {
        assert!(!NullSink.enabled(Level::Critical));
    }
}
