//! Optional log output.
//!
//! The driver does not print anything on its own. A caller registers a [`LogSink`]
//! together with a [`LevelFilter`] threshold, and messages at or above that severity
//! are handed to the sink already formatted (no allocation involved).

use core::fmt;
use log::{Level, LevelFilter};

/// Receives one log message. Severities are ordered `Error < Warn < Info < Debug`.
pub type LogSink = fn(Level, fmt::Arguments<'_>);

/// Sink forwarding into the [`log`] facade under the `mp2722` target
pub fn log_facade(level: Level, args: fmt::Arguments<'_>) {
    log::log!(target: "mp2722", level, "{}", args);
}

/// Sink plus threshold, owned by each controller
#[derive(Clone, Copy)]
pub(crate) struct Logger {
    sink: Option<LogSink>,
    threshold: LevelFilter,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("sink", &self.sink.is_some())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            sink: None,
            threshold: LevelFilter::Info,
        }
    }
}

impl Logger {
    pub fn new(sink: Option<LogSink>, threshold: LevelFilter) -> Self {
        Self { sink, threshold }
    }

    pub fn threshold(&self) -> LevelFilter {
        self.threshold
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if let Some(sink) = self.sink {
            if level <= self.threshold {
                sink(level, args);
            }
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }
}
