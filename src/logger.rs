use std::fmt;

use tracing::Level;

/// Sink for the client's human-readable progress lines.
///
/// Logging is best-effort: nothing a logger does can change the outcome of a
/// request.
pub trait Logger: Send + Sync + fmt::Debug {
    fn log(&self, level: Level, message: &str);
}

/// Forwards every line to `tracing` at the matching level.
///
/// This is the default sink. Without an installed subscriber it emits nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!("{message}"),
            Level::WARN => tracing::warn!("{message}"),
            Level::INFO => tracing::info!("{message}"),
            Level::DEBUG => tracing::debug!("{message}"),
            _ => tracing::trace!("{message}"),
        }
    }
}

/// Discards every line.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: Level, _message: &str) {}
}
