//! The logger core shared by root, child and instance loggers.
//!
//! A [`Logger`] owns a severity threshold and a set of [`Sink`]s. Emitting a
//! record runs the logger filter, then each sink's own filter, so a record
//! below one sink's threshold is dropped for that sink only.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Local;
use sessionlog_core::logging::targets;
use sessionlog_core::{CallSite, LogError, LogRecord, LogResult, Severity, SinkKind};

use crate::format::{LineFormatter, SessionHeader};
use crate::sink::{FileHandle, SharedWriter, Sink, SinkSummary};

/// Anything that accepts log calls.
///
/// Implementors provide [`emit`](Emit::emit); the severity methods capture
/// the caller's file through `#[track_caller]`. The crate's `debug!` ..
/// `critical!` macros additionally capture the calling function's name.
pub trait Emit {
    /// Emit one record at `severity`.
    fn emit(&self, severity: Severity, site: CallSite, message: fmt::Arguments<'_>);

    /// Emit a preformatted message.
    #[track_caller]
    fn log(&self, severity: Severity, message: &str) {
        self.emit(severity, CallSite::caller(), format_args!("{message}"));
    }

    /// Emit at DEBUG.
    #[track_caller]
    fn debug(&self, message: &str) {
        self.emit(Severity::Debug, CallSite::caller(), format_args!("{message}"));
    }

    /// Emit at INFO.
    #[track_caller]
    fn info(&self, message: &str) {
        self.emit(Severity::Info, CallSite::caller(), format_args!("{message}"));
    }

    /// Emit at WARNING.
    #[track_caller]
    fn warning(&self, message: &str) {
        self.emit(Severity::Warning, CallSite::caller(), format_args!("{message}"));
    }

    /// Emit at ERROR.
    #[track_caller]
    fn error(&self, message: &str) {
        self.emit(Severity::Error, CallSite::caller(), format_args!("{message}"));
    }

    /// Emit at CRITICAL.
    #[track_caller]
    fn critical(&self, message: &str) {
        self.emit(Severity::Critical, CallSite::caller(), format_args!("{message}"));
    }
}

struct LoggerState {
    level: Severity,
    formatter: LineFormatter,
    sinks: Vec<Sink>,
}

/// A named logger with its own threshold and sinks.
pub struct Logger {
    name: String,
    state: Mutex<LoggerState>,
}

impl Logger {
    /// Create a logger with no sinks and the default line format.
    pub fn new(name: impl Into<String>, level: Severity) -> Self {
        Self::with_formatter(name, level, LineFormatter::default())
    }

    /// Create a logger whose sinks will use `formatter`.
    pub fn with_formatter(
        name: impl Into<String>,
        level: Severity,
        formatter: LineFormatter,
    ) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(LoggerState {
                level,
                formatter,
                sinks: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, LoggerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dotted logger name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current threshold.
    #[must_use]
    pub fn level(&self) -> Severity {
        self.state().level
    }

    /// Set the threshold of the logger and of every attached sink.
    ///
    /// Sink thresholds are overwritten, including ones that were stricter.
    pub fn set_level(&self, level: Severity) {
        let mut state = self.state();
        state.level = level;
        for sink in &mut state.sinks {
            sink.set_threshold(level);
        }
    }

    /// Whether a record at `severity` passes the logger's own threshold.
    #[must_use]
    pub fn enabled(&self, severity: Severity) -> bool {
        severity.passes(self.level())
    }

    /// Snapshot of the attached sinks.
    #[must_use]
    pub fn sinks(&self) -> Vec<SinkSummary> {
        self.state().sinks.iter().map(SinkSummary::from).collect()
    }

    /// Whether a sink of `kind` is attached.
    #[must_use]
    pub fn has_sink(&self, kind: SinkKind) -> bool {
        self.state().sinks.iter().any(|s| s.kind() == kind)
    }

    /// Change the threshold of the attached sink of `kind` only.
    pub fn set_sink_level(&self, kind: SinkKind, level: Severity) -> LogResult<()> {
        let mut state = self.state();
        let sink = state
            .sinks
            .iter_mut()
            .find(|s| s.kind() == kind)
            .ok_or_else(|| {
                LogError::invalid_config(format!(
                    "no {kind} sink attached to logger '{}'",
                    self.name
                ))
            })?;
        sink.set_threshold(level);
        Ok(())
    }

    fn ensure_vacant(&self, state: &LoggerState, kind: SinkKind) -> LogResult<()> {
        if state.sinks.iter().any(|s| s.kind() == kind) {
            return Err(LogError::AlreadyAttached {
                logger: self.name.clone(),
                kind,
            });
        }
        Ok(())
    }

    /// Attach a file sink at `path`, writing the session header first.
    ///
    /// The threshold defaults to the logger's level. Fails without touching
    /// the sink set if a file sink is already attached.
    pub fn log_to_file(&self, path: impl AsRef<Path>, level: Option<Severity>) -> LogResult<()> {
        let mut state = self.state();
        self.ensure_vacant(&state, SinkKind::File)?;

        let handle = FileHandle::open(path.as_ref())?;
        handle
            .write_all(SessionHeader::file_preamble(Local::now()).as_bytes())
            .map_err(|e| LogError::io(path.as_ref(), e))?;

        let threshold = level.unwrap_or(state.level);
        let sink = Sink::file(threshold, state.formatter.clone(), handle);
        state.sinks.push(sink);
        log::debug!(
            target: targets::SINK,
            "attached file sink {} to '{}' at {}",
            path.as_ref().display(),
            self.name,
            threshold
        );
        Ok(())
    }

    /// Attach a console sink on standard output.
    pub fn log_to_stdout(&self, level: Option<Severity>) -> LogResult<()> {
        self.attach_console(level, None, false)
    }

    /// Attach a console sink on standard output, writing the column header.
    pub fn log_to_stdout_with_header(&self, level: Option<Severity>) -> LogResult<()> {
        self.attach_console(level, None, true)
    }

    /// Attach a console sink on an arbitrary writer.
    pub fn log_to_writer<W>(&self, writer: W, level: Option<Severity>) -> LogResult<()>
    where
        W: Write + Send + 'static,
    {
        let writer: Box<dyn Write + Send> = Box::new(writer);
        self.attach_console(level, Some(Arc::new(Mutex::new(writer))), false)
    }

    pub(crate) fn attach_console(
        &self,
        level: Option<Severity>,
        writer: Option<SharedWriter>,
        write_header: bool,
    ) -> LogResult<()> {
        let mut state = self.state();
        self.ensure_vacant(&state, SinkKind::Console)?;

        let threshold = level.unwrap_or(state.level);
        let formatter = state.formatter.clone();
        let sink = match writer {
            Some(writer) => Sink::writer(threshold, formatter, writer),
            None => Sink::stdout(threshold, formatter),
        };
        if write_header {
            if let Err(err) = sink.write_raw(&SessionHeader::console_preamble()) {
                eprintln!("sessionlog: failed to write console header: {err}");
            }
        }
        state.sinks.push(sink);
        log::debug!(
            target: targets::SINK,
            "attached console sink to '{}' at {}",
            self.name,
            threshold
        );
        Ok(())
    }

    /// Detach the sink of `kind`, releasing its target. Returns whether one
    /// was attached.
    pub fn detach(&self, kind: SinkKind) -> LogResult<bool> {
        let sink = {
            let mut state = self.state();
            match state.sinks.iter().position(|s| s.kind() == kind) {
                Some(idx) => state.sinks.remove(idx),
                None => return Ok(false),
            }
        };
        let path = sink.path().map(Path::to_path_buf);
        sink.release().map_err(|e| match path {
            Some(path) => LogError::io(path, e),
            None => LogError::io(self.name.as_str(), e),
        })?;
        Ok(true)
    }

    /// Detach the console sink.
    pub fn detach_stdout(&self) -> LogResult<bool> {
        self.detach(SinkKind::Console)
    }

    /// Detach the file sink.
    pub fn detach_file(&self) -> LogResult<bool> {
        self.detach(SinkKind::File)
    }

    /// Detach and close every file sink. Never fails; problems are reported
    /// as diagnostics. Returns the number of sinks detached.
    pub fn close(&self) -> usize {
        let files: Vec<Sink> = {
            let mut state = self.state();
            let (files, rest): (Vec<Sink>, Vec<Sink>) = std::mem::take(&mut state.sinks)
                .into_iter()
                .partition(|s| s.kind() == SinkKind::File);
            state.sinks = rest;
            files
        };

        let detached = files.len();
        for sink in files {
            let path = sink.path().map(Path::to_path_buf);
            if let Err(err) = sink.release() {
                log::warn!(
                    target: targets::TEARDOWN,
                    "closing {:?} for '{}' failed: {}",
                    path,
                    self.name,
                    err
                );
                self.emit(
                    Severity::Error,
                    CallSite::new("logger", "close"),
                    format_args!("The logger was not deleted properly."),
                );
            }
        }
        detached
    }

    /// Run a fully built record through the logger and sink filters.
    pub fn log_record(&self, record: &LogRecord) {
        let sinks = {
            let state = self.state();
            if !record.severity.passes(state.level) {
                return;
            }
            state.sinks.clone()
        };
        for sink in &sinks {
            if let Err(err) = sink.write_record(record) {
                eprintln!(
                    "sessionlog: failed to write to {:?} sink of '{}': {err}",
                    sink.kind(),
                    self.name
                );
            }
        }
    }

    /// Derive a child named `name`.
    ///
    /// Sinks are cloned. With an explicit `level`, cloned sinks stricter than
    /// it are lowered to it; others keep the parent's threshold.
    pub(crate) fn derive_child(&self, name: String, level: Option<Severity>) -> Logger {
        let state = self.state();
        let sinks = state
            .sinks
            .iter()
            .map(|sink| {
                let mut sink = sink.clone();
                if let Some(level) = level {
                    if sink.threshold() > level {
                        sink.set_threshold(level);
                    }
                }
                sink
            })
            .collect();

        Logger {
            name,
            state: Mutex::new(LoggerState {
                level: level.unwrap_or(state.level),
                formatter: state.formatter.clone(),
                sinks,
            }),
        }
    }
}

impl Emit for Logger {
    fn emit(&self, severity: Severity, site: CallSite, message: fmt::Arguments<'_>) {
        if !self.enabled(severity) {
            return;
        }
        let record = LogRecord::new(severity, self.name.as_str(), site, message.to_string());
        self.log_record(&record);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &state.level)
            .field("sinks", &state.sinks.len())
            .finish()
    }
}
