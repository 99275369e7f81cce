//! Diagnostics emitted by sessionlog itself.
//!
//! sessionlog reports its own lifecycle (sink attachment, name allocation,
//! teardown) through the standard [`log`] facade so that a host application
//! sees those events in whatever backend it installed. Nothing here writes
//! to a session's own sinks.
//!
//! Example filter: `RUST_LOG=sessionlog::teardown=debug`

// Re-export log macros for ergonomic use
pub use log::{debug, error, info, trace, warn};

/// Log targets used by sessionlog components.
pub mod targets {
    /// Root target for all sessionlog diagnostics.
    pub const SESSIONLOG: &str = "sessionlog";

    /// Session construction and logger registry.
    pub const SESSION: &str = "sessionlog::session";

    /// Sink attachment and detachment.
    pub const SINK: &str = "sessionlog::sink";

    /// Logger disposal.
    pub const TEARDOWN: &str = "sessionlog::teardown";

    /// Panic hook install and uninstall.
    pub const HOOK: &str = "sessionlog::hook";
}
