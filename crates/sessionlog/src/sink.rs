//! Output sinks.
//!
//! A [`Sink`] is a value type: kind, threshold, formatter and target. Cloning
//! a sink copies its threshold and shares its target, so a child logger can
//! loosen or tighten its copy without touching the parent's.
//!
//! File targets share one OS handle between clones. The handle is released
//! when the last sink holding it is detached.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use sessionlog_core::{LogError, LogRecord, LogResult, Severity, SinkKind};

use crate::format::LineFormatter;

/// A writer shared between sink clones.
pub(crate) type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// An append-mode log file.
pub struct FileHandle {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileHandle {
    /// Open `path` for append, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LogError::io(&path, e))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path the handle was opened with.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write bytes with a single `write_all`.
    pub fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(bytes)
    }

    /// Sync and close the file.
    pub fn close(self) -> io::Result<()> {
        let file = self.file.into_inner().unwrap_or_else(PoisonError::into_inner);
        file.sync_all()
    }
}

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle").field("path", &self.path).finish()
    }
}

/// Where a sink's lines go.
#[derive(Clone)]
pub(crate) enum SinkTarget {
    Stdout,
    Writer(SharedWriter),
    File(Arc<FileHandle>),
    /// Rejects every write and release.
    #[cfg(test)]
    Failing,
}

impl SinkTarget {
    fn write_all(&self, bytes: &[u8]) -> io::Result<()> {
        match self {
            SinkTarget::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(bytes)?;
                out.flush()
            }
            SinkTarget::Writer(writer) => {
                let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
                writer.write_all(bytes)?;
                writer.flush()
            }
            SinkTarget::File(handle) => handle.write_all(bytes),
            #[cfg(test)]
            SinkTarget::Failing => Err(io::Error::other("failing target")),
        }
    }
}

impl fmt::Debug for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkTarget::Stdout => f.write_str("Stdout"),
            SinkTarget::Writer(_) => f.write_str("Writer"),
            SinkTarget::File(handle) => write!(f, "File({})", handle.path().display()),
            #[cfg(test)]
            SinkTarget::Failing => f.write_str("Failing"),
        }
    }
}

/// A configured output destination.
#[derive(Debug, Clone)]
pub struct Sink {
    kind: SinkKind,
    threshold: Severity,
    formatter: LineFormatter,
    target: SinkTarget,
}

impl Sink {
    pub(crate) fn stdout(threshold: Severity, formatter: LineFormatter) -> Self {
        Self {
            kind: SinkKind::Console,
            threshold,
            formatter,
            target: SinkTarget::Stdout,
        }
    }

    pub(crate) fn writer(
        threshold: Severity,
        formatter: LineFormatter,
        writer: SharedWriter,
    ) -> Self {
        Self {
            kind: SinkKind::Console,
            threshold,
            formatter,
            target: SinkTarget::Writer(writer),
        }
    }

    pub(crate) fn file(threshold: Severity, formatter: LineFormatter, handle: FileHandle) -> Self {
        Self {
            kind: SinkKind::File,
            threshold,
            formatter,
            target: SinkTarget::File(Arc::new(handle)),
        }
    }

    /// A file-kind sink whose writes and release fail.
    #[cfg(test)]
    pub(crate) fn failing_file(threshold: Severity) -> Self {
        Self {
            kind: SinkKind::File,
            threshold,
            formatter: LineFormatter::default(),
            target: SinkTarget::Failing,
        }
    }

    /// Sink kind.
    #[must_use]
    pub fn kind(&self) -> SinkKind {
        self.kind
    }

    /// Minimum severity this sink writes.
    #[must_use]
    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    /// Change the minimum severity.
    pub fn set_threshold(&mut self, threshold: Severity) {
        self.threshold = threshold;
    }

    /// File path for file sinks.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            SinkTarget::File(handle) => Some(handle.path()),
            _ => None,
        }
    }

    /// Write raw text, bypassing threshold and formatter.
    pub(crate) fn write_raw(&self, text: &str) -> io::Result<()> {
        self.target.write_all(text.as_bytes())
    }

    /// Format and write a record if it passes this sink's threshold.
    ///
    /// Returns whether a line was written.
    pub fn write_record(&self, record: &LogRecord) -> io::Result<bool> {
        if !record.severity.passes(self.threshold) {
            return Ok(false);
        }
        let mut line = self.formatter.format(record);
        line.push('\n');
        self.target.write_all(line.as_bytes())?;
        Ok(true)
    }

    /// Detach this sink, closing its file if no other sink shares it.
    pub(crate) fn release(self) -> io::Result<()> {
        match self.target {
            SinkTarget::File(handle) => match Arc::try_unwrap(handle) {
                Ok(handle) => handle.close(),
                Err(_shared) => Ok(()),
            },
            SinkTarget::Writer(writer) => {
                let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
                writer.flush()
            }
            SinkTarget::Stdout => io::stdout().flush(),
            #[cfg(test)]
            SinkTarget::Failing => Err(io::Error::other("failing target")),
        }
    }
}

/// Read-only view of an attached sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkSummary {
    /// Sink kind.
    pub kind: SinkKind,
    /// Minimum severity.
    pub threshold: Severity,
    /// File path, for file sinks.
    pub path: Option<PathBuf>,
}

impl From<&Sink> for SinkSummary {
    fn from(sink: &Sink) -> Self {
        Self {
            kind: sink.kind,
            threshold: sink.threshold,
            path: sink.path().map(Path::to_path_buf),
        }
    }
}
