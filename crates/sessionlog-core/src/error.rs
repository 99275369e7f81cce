//! Error types for sessionlog operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The two sink kinds a logger can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    /// Standard output, or a writer standing in for it.
    Console,
    /// An append-mode log file.
    File,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Console => f.write_str("console"),
            SinkKind::File => f.write_str("file"),
        }
    }
}

/// Coarse classification of a [`LogError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid or conflicting configuration.
    Configuration,
    /// A logger name argument had the wrong type.
    NameType,
    /// A named logger was not registered.
    Lookup,
    /// Filesystem failure.
    Io,
}

/// Errors returned by logger construction and configuration.
#[derive(Debug)]
pub enum LogError {
    /// A sink of this kind is already attached to the logger.
    AlreadyAttached {
        /// Logger name.
        logger: String,
        /// Sink kind that was attached twice.
        kind: SinkKind,
    },
    /// A configuration value could not be used.
    InvalidConfig(String),
    /// A logger name was neither a string nor absent.
    NameType {
        /// Name of the type actually received.
        received: String,
    },
    /// No logger is registered under the key.
    NotFound {
        /// The missing key.
        key: String,
    },
    /// Opening or reading a file failed.
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

/// Result alias used throughout sessionlog.
pub type LogResult<T> = Result<T, LogError>;

impl LogError {
    /// Configuration error helper.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Name type error helper.
    pub fn name_type(received: impl Into<String>) -> Self {
        Self::NameType {
            received: received.into(),
        }
    }

    /// Lookup error helper.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// IO error helper.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            LogError::AlreadyAttached { .. } | LogError::InvalidConfig(_) => {
                ErrorKind::Configuration
            }
            LogError::NameType { .. } => ErrorKind::NameType,
            LogError::NotFound { .. } => ErrorKind::Lookup,
            LogError::Io { .. } => ErrorKind::Io,
        }
    }
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::AlreadyAttached { logger, kind } => {
                write!(f, "{kind} sink already defined for logger '{logger}'")
            }
            LogError::InvalidConfig(msg) => write!(f, "invalid logging configuration: {msg}"),
            LogError::NameType { received } => {
                write!(f, "logger name must be a string or absent, not {received}")
            }
            LogError::NotFound { key } => write!(f, "there are no instances with name {key}"),
            LogError::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for LogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
