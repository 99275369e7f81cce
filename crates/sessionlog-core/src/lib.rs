//! Core types for sessionlog.
//!
//! This crate provides the leaf building blocks shared by the façade crate:
//! - [`Severity`], the ordered five-level scale
//! - [`LogRecord`] and [`CallSite`], the data handed to formatters
//! - [`LogError`], the error taxonomy for every fallible operation
//!
//! It has no knowledge of sinks, loggers or sessions.

#![forbid(unsafe_code)]

mod error;
pub mod logging;
mod record;
mod severity;

pub use error::{ErrorKind, LogError, LogResult, SinkKind};
pub use record::{CallSite, LogRecord, UNKNOWN_FUNCTION, module_stem};
#[doc(hidden)]
pub use record::trim_function_path;
pub use severity::Severity;

/// Expands to the bare name of the enclosing function.
///
/// Closures resolve to the function that defines them.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::trim_function_path(__type_name_of(__here))
    }};
}

/// Expands to a [`CallSite`] for the current source location.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new($crate::module_stem(file!()), $crate::function_name!())
    };
}
