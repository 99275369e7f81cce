//! `log` crate integration.

use std::sync::Arc;

use log::{Log, Metadata, Record};
use sessionlog_core::{LogRecord, Severity, UNKNOWN_FUNCTION};

use super::{is_internal, module_of};
use crate::logger::Logger;

/// Forwards `log` facade records into a [`Logger`].
///
/// `TRACE` records are mapped to DEBUG. The logger's own threshold and its
/// sinks' thresholds apply as for direct calls.
#[derive(Debug, Clone)]
pub struct SessionBridge {
    logger: Arc<Logger>,
}

impl SessionBridge {
    /// Create a bridge to `logger`.
    #[must_use]
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }

    /// Install a bridge to `logger` as the global `log` logger.
    ///
    /// The facade's max level follows the logger's threshold at install time.
    pub fn init(logger: Arc<Logger>) -> Result<(), log::SetLoggerError> {
        let level = log::Level::from(logger.level());
        log::set_boxed_logger(Box::new(Self::new(logger)))?;
        log::set_max_level(level.to_level_filter());
        Ok(())
    }

    /// Install, ignoring errors if a logger is already set.
    pub fn try_init(logger: Arc<Logger>) {
        let _ = Self::init(logger);
    }

    /// The target logger.
    #[must_use]
    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }
}

impl Log for SessionBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        !is_internal(metadata.target()) && self.logger.enabled(Severity::from(metadata.level()))
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let event = LogRecord {
            severity: Severity::from(record.level()),
            logger_name: self.logger.name().to_string(),
            module: module_of(record.file(), record.target()),
            function: UNKNOWN_FUNCTION.to_string(),
            message: record.args().to_string(),
            instance_name: String::new(),
            timestamp: chrono::Local::now(),
        };
        self.logger.log_record(&event);
    }

    fn flush(&self) {}
}
