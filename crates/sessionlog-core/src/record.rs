//! Log records and call-site capture.

use std::panic::Location;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::severity::Severity;

/// Function name used when the call site was captured without the macros.
pub const UNKNOWN_FUNCTION: &str = "<unknown>";

/// Where a log call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Source file stem of the caller (e.g. `worker` for `src/worker.rs`).
    pub module: &'static str,
    /// Bare name of the calling function.
    pub function: &'static str,
}

impl CallSite {
    /// Create a call site from its parts.
    #[must_use]
    pub const fn new(module: &'static str, function: &'static str) -> Self {
        Self { module, function }
    }

    /// Capture the caller's file. The function name is not available this
    /// way and is reported as [`UNKNOWN_FUNCTION`].
    #[track_caller]
    #[must_use]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self::new(module_stem(location.file()), UNKNOWN_FUNCTION)
    }
}

/// File stem of a source path, falling back to the path itself.
#[must_use]
pub fn module_stem(file: &'static str) -> &'static str {
    Path::new(file)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file)
}

/// Reduce a `type_name` of a nested fn item to the enclosing function name.
#[doc(hidden)]
#[must_use]
pub fn trim_function_path(path: &'static str) -> &'static str {
    let mut path = path.strip_suffix("::__here").unwrap_or(path);
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    match path.rfind("::") {
        Some(idx) => &path[idx + 2..],
        None => path,
    }
}

/// A single log event on its way to the sinks.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Severity of the event.
    pub severity: Severity,
    /// Dotted name of the emitting logger.
    pub logger_name: String,
    /// Caller's module (file stem).
    pub module: String,
    /// Caller's function.
    pub function: String,
    /// The message, untouched.
    pub message: String,
    /// Display name of the bound instance; empty when there is none.
    pub instance_name: String,
    /// Local wall-clock time of the call.
    pub timestamp: DateTime<Local>,
}

impl LogRecord {
    /// Create a record stamped with the current time and no instance name.
    pub fn new(
        severity: Severity,
        logger_name: impl Into<String>,
        site: CallSite,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            logger_name: logger_name.into(),
            module: site.module.to_string(),
            function: site.function.to_string(),
            message: message.into(),
            instance_name: String::new(),
            timestamp: Local::now(),
        }
    }

    /// Set the instance name.
    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    /// Override the timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
