//! CaptureBuffer for capturing console sink output in tests
//!
//! Provides a writer that can stand in for standard output, plus assertion
//! helpers over the captured lines.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(test)]
use crate::sink::SharedWriter;

/// Captures everything written by console sinks attached to it
///
/// Attach it with [`SessionBuilder::console_writer`](crate::SessionBuilder::console_writer)
/// or [`Logger::log_to_writer`](crate::Logger::log_to_writer) using
/// [`writer()`](Self::writer), then use `output()`, `contains()` and the
/// assertion methods to verify what was logged.
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

/// Write half of a [`CaptureBuffer`].
#[derive(Clone)]
pub struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CaptureBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A writer appending to this buffer
    #[must_use]
    pub fn writer(&self) -> CaptureWriter {
        CaptureWriter(self.bytes.clone())
    }

    #[cfg(test)]
    pub(crate) fn shared_writer(&self) -> SharedWriter {
        let writer: Box<dyn Write + Send> = Box::new(self.writer());
        Arc::new(Mutex::new(writer))
    }

    /// Get all captured output as a single string
    #[must_use]
    pub fn output_string(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Get all captured lines
    #[must_use]
    pub fn output(&self) -> Vec<String> {
        self.output_string().lines().map(str::to_string).collect()
    }

    /// Check if output contains a string (case-sensitive)
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.output_string().contains(needle)
    }

    /// Check if output contains a string, ignoring case
    #[must_use]
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        self.output_string()
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }

    /// Check if output contains all of the given strings
    #[must_use]
    pub fn contains_all(&self, needles: &[&str]) -> bool {
        let output = self.output_string();
        needles.iter().all(|n| output.contains(n))
    }

    /// Check if output matches a regex pattern
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        match regex::Regex::new(pattern) {
            Ok(re) => re.is_match(&self.output_string()),
            Err(_) => false,
        }
    }

    /// Assert that output contains a string
    ///
    /// # Panics
    ///
    /// Panics if the output does not contain the needle string.
    pub fn assert_contains(&self, needle: &str) {
        assert!(
            self.contains(needle),
            "Output did not contain '{}'. Actual output:\n{}",
            needle,
            self.output_string()
        );
    }

    /// Assert that output does NOT contain a string
    ///
    /// # Panics
    ///
    /// Panics if the output contains the needle string.
    pub fn assert_not_contains(&self, needle: &str) {
        assert!(
            !self.contains(needle),
            "Output unexpectedly contained '{}'. Actual output:\n{}",
            needle,
            self.output_string()
        );
    }

    /// Assert output has specific number of lines
    ///
    /// # Panics
    ///
    /// Panics if the line count doesn't match expected.
    pub fn assert_line_count(&self, expected: usize) {
        let actual = self.output().len();
        assert_eq!(
            actual,
            expected,
            "Expected {} lines but got {}. Actual output:\n{}",
            expected,
            actual,
            self.output_string()
        );
    }

    /// Clear the buffer
    pub fn clear(&self) {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Print output for debugging (in tests)
    pub fn debug_print(&self) {
        eprintln!("=== CaptureBuffer Output ===");
        for (i, line) in self.output().iter().enumerate() {
            eprintln!("{:3}: {}", i + 1, line);
        }
        eprintln!("============================");
    }
}

impl std::fmt::Debug for CaptureBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureBuffer")
            .field("line_count", &self.output().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_visible_through_clones() {
        let capture = CaptureBuffer::new();
        let mut writer = capture.writer();
        writeln!(writer, "first").unwrap();
        writeln!(writer, "second").unwrap();

        let other = capture.clone();
        assert_eq!(other.output(), vec!["first", "second"]);
        other.assert_line_count(2);
    }

    #[test]
    fn contains_is_case_sensitive() {
        let capture = CaptureBuffer::new();
        write!(capture.writer(), "INFO - ready").unwrap();
        assert!(capture.contains("INFO"));
        assert!(!capture.contains("info"));
        assert!(capture.contains_ignore_case("info"));
        assert!(capture.contains_all(&["INFO", "ready"]));
    }

    #[test]
    fn matches_regex() {
        let capture = CaptureBuffer::new();
        write!(capture.writer(), "ERROR -  - m - f - code 42").unwrap();
        assert!(capture.matches(r"code \d+$"));
        assert!(!capture.matches(r"[invalid"));
    }

    #[test]
    fn clear_empties_buffer() {
        let capture = CaptureBuffer::new();
        write!(capture.writer(), "x").unwrap();
        capture.clear();
        assert!(capture.output().is_empty());
    }

    #[test]
    #[should_panic(expected = "did not contain")]
    fn assert_contains_panics_on_missing() {
        CaptureBuffer::new().assert_contains("absent");
    }
}
