//! Injectable logger handle.
//!
//! Entities and flows log through a [`Logger`] they are given rather than the
//! process-wide `log` macros, so a host can route each light's records
//! separately and tests can observe them.

use std::fmt;
use std::sync::Arc;

use log::{Level, Log, Metadata, Record};

/// A `log::Log` sink paired with the target records are emitted under.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn Log>,
    target: String,
}

impl Logger {
    pub const DEFAULT_TARGET: &'static str = "aquael_rs";

    /// Log through `sink` under the crate's default target.
    pub fn new(sink: Arc<dyn Log>) -> Self {
        Logger {
            sink,
            target: Self::DEFAULT_TARGET.to_string(),
        }
    }

    /// Log through whatever logger the host installed with `log::set_logger`.
    pub fn global() -> Self {
        Self::new(Arc::new(GlobalLog))
    }

    /// Same sink, different target.
    pub fn with_target(&self, target: &str) -> Self {
        Logger {
            sink: Arc::clone(&self.sink),
            target: target.to_string(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        let metadata = Metadata::builder()
            .level(level)
            .target(&self.target)
            .build();
        if !self.sink.enabled(&metadata) {
            return;
        }
        self.sink.log(
            &Record::builder()
                .metadata(metadata)
                .args(args)
                .module_path_static(Some(module_path!()))
                .build(),
        );
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args)
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args)
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args)
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args)
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::global()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Forwards to the process-wide logger, honouring `log::max_level`.
struct GlobalLog;

impl Log for GlobalLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level() && log::logger().enabled(metadata)
    }

    fn log(&self, record: &Record) {
        log::logger().log(record)
    }

    fn flush(&self) {
        log::logger().flush()
    }
}
