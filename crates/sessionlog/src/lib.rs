//! Session-scoped logging with console and file sinks.
//!
//! A [`Session`] owns a root [`Logger`] plus every child and instance logger
//! derived from it:
//! - [`Logger`] - threshold plus at most one console and one file sink
//! - [`InstanceLogger`] - a child logger stamping lines with a live object's name
//! - [`Session`] - registry, sink setup from [`LoggerConfig`], panic hook, teardown
//! - [`logging`] - bridges from the `log` and `tracing` ecosystems
//!
//! Lines look like `LEVEL - INSTANCE_NAME - MODULE - FUNCTION - MESSAGE`.
//!
//! # Example
//!
//! ```ignore
//! use sessionlog::{Session, Severity};
//!
//! let session = Session::builder()
//!     .level(Severity::Info)
//!     .file_path("service.log")
//!     .build()?;
//!
//! sessionlog::info!(session, "listening on {}", port);
//! let db = session.add_child_logger("db", Some(Severity::Warning))?;
//! sessionlog::warning!(db, "pool exhausted");
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod format;
pub mod hook;
pub mod instance;
pub mod logger;
pub mod logging;
pub mod session;
pub mod sink;
pub mod testing;

pub use config::{ChildSpec, LoggerConfig};
pub use format::{LineFormatter, SessionHeader};
pub use hook::{Interrupted, PanicHook};
pub use instance::{DisplayName, InstanceLogger};
pub use logger::{Emit, Logger};
pub use session::{NameArg, Registered, Session, SessionBuilder};
pub use sink::{Sink, SinkSummary};

pub use sessionlog_core::{
    CallSite, ErrorKind, LogError, LogRecord, LogResult, Severity, SinkKind, call_site,
    function_name,
};

#[doc(hidden)]
#[macro_export]
macro_rules! __emit {
    ($logger:expr, $severity:ident, $($arg:tt)+) => {{
        use $crate::Emit as _;
        ($logger).emit(
            $crate::Severity::$severity,
            $crate::call_site!(),
            ::std::format_args!($($arg)+),
        )
    }};
}

/// Log at DEBUG, recording the calling function's name.
///
/// ```ignore
/// sessionlog::debug!(logger, "cache size {}", cache.len());
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($logger, Debug, $($arg)+)
    };
}

/// Log at INFO, recording the calling function's name.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($logger, Info, $($arg)+)
    };
}

/// Log at WARNING, recording the calling function's name.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($logger, Warning, $($arg)+)
    };
}

/// Log at ERROR, recording the calling function's name.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($logger, Error, $($arg)+)
    };
}

/// Log at CRITICAL, recording the calling function's name.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__emit!($logger, Critical, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CaptureBuffer;

    #[test]
    fn macros_capture_module_and_function() {
        let capture = CaptureBuffer::new();
        let logger = Logger::new("root", Severity::Debug);
        logger.log_to_writer(capture.writer(), None).unwrap();

        crate::info!(logger, "value {}", 42);
        crate::critical!(&logger, "stop");

        capture.assert_contains("INFO -  - lib - macros_capture_module_and_function - value 42");
        capture.assert_contains("CRITICAL -  - lib - macros_capture_module_and_function - stop");
    }
}
