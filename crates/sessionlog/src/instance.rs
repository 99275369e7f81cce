//! Loggers bound to a long-lived object.
//!
//! An [`InstanceLogger`] wraps a child [`Logger`] and a weak reference to an
//! object implementing [`DisplayName`]. The name is read on every emit, so a
//! renamed object shows its new name from the next line on.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Weak};

use sessionlog_core::{CallSite, LogRecord, LogResult, Severity};

use crate::logger::{Emit, Logger};

/// Objects that can name themselves in log lines.
pub trait DisplayName {
    /// Current display name.
    fn display_name(&self) -> String;
}

/// A child logger that stamps records with an instance's display name.
pub struct InstanceLogger {
    logger: Arc<Logger>,
    instance: Weak<dyn DisplayName + Send + Sync>,
}

impl InstanceLogger {
    /// Bind `logger` to `instance` without taking ownership of it.
    pub fn new<T>(logger: Arc<Logger>, instance: &Arc<T>) -> Self
    where
        T: DisplayName + Send + Sync + 'static,
    {
        let instance: Weak<T> = Arc::downgrade(instance);
        let instance: Weak<dyn DisplayName + Send + Sync> = instance;
        Self { logger, instance }
    }

    /// The wrapped logger.
    #[must_use]
    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// Registered name of this logger.
    #[must_use]
    pub fn name(&self) -> &str {
        self.logger.name()
    }

    /// The instance's name right now; empty once the instance is dropped.
    #[must_use]
    pub fn instance_name(&self) -> String {
        self.instance
            .upgrade()
            .map(|instance| instance.display_name())
            .unwrap_or_default()
    }

    /// See [`Logger::level`].
    #[must_use]
    pub fn level(&self) -> Severity {
        self.logger.level()
    }

    /// See [`Logger::set_level`].
    pub fn set_level(&self, level: Severity) {
        self.logger.set_level(level);
    }

    /// See [`Logger::log_to_file`].
    pub fn log_to_file(&self, path: impl AsRef<Path>, level: Option<Severity>) -> LogResult<()> {
        self.logger.log_to_file(path, level)
    }

    /// See [`Logger::log_to_stdout`].
    pub fn log_to_stdout(&self, level: Option<Severity>) -> LogResult<()> {
        self.logger.log_to_stdout(level)
    }

    /// See [`Logger::log_to_writer`].
    pub fn log_to_writer<W>(&self, writer: W, level: Option<Severity>) -> LogResult<()>
    where
        W: Write + Send + 'static,
    {
        self.logger.log_to_writer(writer, level)
    }
}

impl Emit for InstanceLogger {
    fn emit(&self, severity: Severity, site: CallSite, message: fmt::Arguments<'_>) {
        if !self.logger.enabled(severity) {
            return;
        }
        let record = LogRecord::new(severity, self.logger.name(), site, message.to_string())
            .with_instance_name(self.instance_name());
        self.logger.log_record(&record);
    }
}

impl fmt::Debug for InstanceLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceLogger")
            .field("logger", &self.logger)
            .field("instance_name", &self.instance_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CaptureBuffer;
    use std::sync::Mutex;

    struct Product {
        name: Mutex<String>,
    }

    impl Product {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: Mutex::new(name.to_string()),
            })
        }

        fn rename(&self, name: &str) {
            *self.name.lock().unwrap() = name.to_string();
        }
    }

    impl DisplayName for Product {
        fn display_name(&self) -> String {
            self.name.lock().unwrap().clone()
        }
    }

    fn bound(product: &Arc<Product>) -> (InstanceLogger, CaptureBuffer) {
        let capture = CaptureBuffer::new();
        let logger = Arc::new(Logger::new("product", Severity::Debug));
        logger.log_to_writer(capture.writer(), None).unwrap();
        (InstanceLogger::new(logger, product), capture)
    }

    #[test]
    fn name_is_resolved_per_call() {
        let product = Product::new("foo");
        let (logger, capture) = bound(&product);

        logger.info("m");
        product.rename("bar");
        logger.info("m2");

        let lines = capture.output();
        assert_eq!(lines[0], "INFO - foo - instance - <unknown> - m");
        assert_eq!(lines[1], "INFO - bar - instance - <unknown> - m2");
    }

    #[test]
    fn dropped_instance_yields_empty_name() {
        let product = Product::new("gone");
        let (logger, capture) = bound(&product);
        drop(product);

        logger.warning("orphan");
        capture.assert_contains("WARNING -  - instance - <unknown> - orphan");
    }

    #[test]
    fn delegates_level_changes() {
        let product = Product::new("p");
        let (logger, capture) = bound(&product);
        logger.set_level(Severity::Error);

        logger.warning("hidden");
        logger.error("shown");
        assert_eq!(logger.level(), Severity::Error);
        capture.assert_not_contains("hidden");
        capture.assert_contains("ERROR - p - instance - <unknown> - shown");
    }

    #[test]
    fn second_stdout_sink_is_rejected() {
        let product = Product::new("p");
        let (logger, _capture) = bound(&product);
        assert!(logger.log_to_stdout(None).is_err());
        assert_eq!(logger.logger().sinks().len(), 1);
    }
}
