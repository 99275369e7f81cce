//! Panic hook that records panics.
//!
//! The first [`PanicHook::install`] places one dispatcher in front of the
//! process's current panic hook. The dispatcher logs each panic at CRITICAL
//! on every logger holding a live [`PanicHook`], with its location and (when
//! `RUST_BACKTRACE` enables it) the backtrace, then hands over to the hook
//! that was there before. Panics carrying an [`Interrupted`] payload skip the
//! logging step.
//!
//! Guards can be installed and dropped in any order. Once no guard is left
//! the dispatcher only forwards to the previous hook.
//!
//! The hook runs before unwinding starts, so it also records panics that are
//! later recovered: ones caught by `std::panic::catch_unwind` and ones ending
//! a thread whose `JoinHandle` is joined.

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Once, PoisonError, Weak};

use sessionlog_core::logging::targets;
use sessionlog_core::{LogRecord, Severity, UNKNOWN_FUNCTION, module_stem};

use crate::logger::Logger;

type BoxedHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;
type Subscribers = Vec<(u64, Weak<Logger>)>;

static DISPATCHER: Once = Once::new();
static SUBSCRIBERS: Mutex<Subscribers> = Mutex::new(Vec::new());
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn subscribers() -> MutexGuard<'static, Subscribers> {
    SUBSCRIBERS.lock().unwrap_or_else(PoisonError::into_inner)
}

fn install_dispatcher() {
    DISPATCHER.call_once(|| {
        let previous: BoxedHook = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !info.payload().is::<Interrupted>() {
                dispatch(info);
            }
            previous(info);
        }));
        log::debug!(target: targets::HOOK, "panic dispatcher installed");
    });
}

/// Panic payload for a user-initiated stop.
///
/// `std::panic::panic_any(Interrupted)` unwinds without being logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Guard subscribing a logger to panics. Dropping it unsubscribes.
pub struct PanicHook {
    id: u64,
    active: bool,
}

impl PanicHook {
    /// Subscribe `logger` to panics.
    ///
    /// Only a weak reference is kept; a dropped logger is skipped.
    pub fn install(logger: &Arc<Logger>) -> Self {
        install_dispatcher();
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        subscribers().push((id, Arc::downgrade(logger)));
        log::debug!(
            target: targets::HOOK,
            "panic hook {} installed for '{}'",
            id,
            logger.name()
        );
        Self { id, active: true }
    }

    /// Unsubscribe. Other installed guards are unaffected.
    pub fn uninstall(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        let id = self.id;
        subscribers().retain(|(entry, _)| *entry != id);
        log::debug!(target: targets::HOOK, "panic hook {} uninstalled", id);
    }
}

impl Drop for PanicHook {
    fn drop(&mut self) {
        self.remove();
    }
}

impl std::fmt::Debug for PanicHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanicHook")
            .field("id", &self.id)
            .field("installed", &self.active)
            .finish()
    }
}

fn payload_text(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "Box<dyn Any>"
    }
}

fn dispatch(info: &PanicHookInfo<'_>) {
    // Snapshot so no lock is held while writing.
    let loggers: Vec<Arc<Logger>> = subscribers()
        .iter()
        .filter_map(|(_, logger)| logger.upgrade())
        .collect();
    if loggers.is_empty() {
        return;
    }

    let mut message = format!("Uncaught panic: {}", payload_text(info.payload()));
    let module = match info.location() {
        Some(location) => {
            message.push_str(&format!(
                " at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            ));
            std::path::Path::new(location.file())
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_else(|| module_stem(file!()))
                .to_string()
        }
        None => module_stem(file!()).to_string(),
    };

    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        message.push_str(&format!("\nBacktrace:\n{backtrace}"));
    }

    let timestamp = chrono::Local::now();
    for logger in loggers {
        let record = LogRecord {
            severity: Severity::Critical,
            logger_name: logger.name().to_string(),
            module: module.clone(),
            function: UNKNOWN_FUNCTION.to_string(),
            message: message.clone(),
            instance_name: String::new(),
            timestamp,
        };
        logger.log_record(&record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_text_handles_common_payloads() {
        let static_str: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned boom"));
        let other: Box<dyn Any + Send> = Box::new(42_u32);

        assert_eq!(payload_text(static_str.as_ref()), "boom");
        assert_eq!(payload_text(owned.as_ref()), "owned boom");
        assert_eq!(payload_text(other.as_ref()), "Box<dyn Any>");
    }

    #[test]
    fn guards_unsubscribe_only_themselves() {
        let first = Arc::new(Logger::new("first", Severity::Debug));
        let second = Arc::new(Logger::new("second", Severity::Debug));
        let first_hook = PanicHook::install(&first);
        let second_hook = PanicHook::install(&second);
        let (first_id, second_id) = (first_hook.id, second_hook.id);

        drop(first_hook);
        {
            let live = subscribers();
            assert!(!live.iter().any(|(id, _)| *id == first_id));
            assert!(live.iter().any(|(id, _)| *id == second_id));
        }

        second_hook.uninstall();
        assert!(!subscribers().iter().any(|(id, _)| *id == second_id));
    }
}
