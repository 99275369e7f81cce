//! Testing utilities for sessionlog output
//!
//! Provides `CaptureBuffer` for capturing and asserting on console sink output.

mod capture;

pub use capture::{CaptureBuffer, CaptureWriter};
