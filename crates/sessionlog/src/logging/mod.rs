//! Bridges from the `log` and `tracing` ecosystems into a session.
//!
//! - [`SessionBridge`] - A `log` crate logger forwarding into a [`Logger`](crate::Logger)
//! - [`SessionLayer`] - A `tracing_subscriber` layer doing the same for tracing events
//!
//! Both ignore sessionlog's own diagnostic targets, so installing them never
//! feeds a logger back into itself.
//!
//! # Example
//!
//! ```ignore
//! use sessionlog::Session;
//! use sessionlog::logging::SessionBridge;
//!
//! let session = Session::builder().build()?;
//! SessionBridge::init(session.root().clone())?;
//! log::info!("routed through the session");
//! ```

mod bridge;
mod layer;

pub use bridge::SessionBridge;
pub use layer::SessionLayer;

use sessionlog_core::logging::targets;

fn is_internal(target: &str) -> bool {
    target
        .strip_prefix(targets::SESSIONLOG)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Module name for a foreign record: the source file stem when known,
/// otherwise the last segment of the target.
fn module_of(file: Option<&str>, target: &str) -> String {
    file.and_then(|file| std::path::Path::new(file).file_stem())
        .and_then(|stem| stem.to_str())
        .map_or_else(
            || target.rsplit("::").next().unwrap_or(target).to_string(),
            str::to_string,
        )
}
