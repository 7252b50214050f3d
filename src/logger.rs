//! Injected logging facade.
//!
//! Per spec.md §9's redesign note, the scheduler never calls process-wide
//! logging macros directly; it is handed an `Arc<dyn Logger>` instead. The
//! default implementation forwards to the `log` crate, exactly the crate
//! this repo's own host program would call `pretty_env_logger::init()`
//! against at startup.

use std::sync::Arc;

/// A log line's severity. Mirrors `log::Level` without requiring callers to
/// depend on the `log` crate themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Injected logging sink. The scheduler and messenger hold one of these
/// rather than calling `log::info!` et al. directly, so a host program can
/// redirect worker lifecycle output (or silence it) without the core
/// depending on any particular logging backend.
pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn trace(&self, message: &str) {
        self.log(Level::Trace, message);
    }

    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

/// Forwards every line to the `log` crate's global logger (the one
/// `pretty_env_logger::init()` installs). This is the default handed to
/// [`crate::scheduler::Scheduler`] when no other `Logger` is supplied.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogCrateLogger;

impl Logger for LogCrateLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Trace => log::trace!("{message}"),
            Level::Debug => log::debug!("{message}"),
            Level::Info => log::info!("{message}"),
            Level::Warn => log::warn!("{message}"),
            Level::Error => log::error!("{message}"),
        }
    }
}

/// Convenience constructor for the default logger, boxed for storage next
/// to a `Config`.
pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(LogCrateLogger)
}
