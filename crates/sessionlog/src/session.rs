//! Logging sessions: the root logger plus its registry of children.
//!
//! A [`Session`] owns the root [`Logger`], every child and instance logger
//! derived from it, and optionally the panic hook. Dropping the session
//! closes their file sinks (unless cleanup is disabled).

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Write;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sessionlog_core::logging::targets;
use sessionlog_core::{CallSite, LogError, LogResult, Severity};

use crate::config::LoggerConfig;
use crate::format::LineFormatter;
use crate::hook::PanicHook;
use crate::instance::{DisplayName, InstanceLogger};
use crate::logger::{Emit, Logger};
use crate::sink::SharedWriter;

/// Base name for instance loggers created without a name.
pub const UNNAMED_INSTANCE: &str = "NO_NAMED_YET";

/// Values accepted as a logger name.
///
/// Strings name the logger, `None` leaves it unnamed. Dynamic values coming
/// from configuration files must hold a string; any other type is rejected
/// with [`LogError::NameType`].
pub trait NameArg {
    /// Resolve to a name, or `None` when absent.
    fn into_name(self) -> LogResult<Option<String>>;
}

impl NameArg for &str {
    fn into_name(self) -> LogResult<Option<String>> {
        Ok(Some(self.to_string()))
    }
}

impl NameArg for String {
    fn into_name(self) -> LogResult<Option<String>> {
        Ok(Some(self))
    }
}

impl NameArg for &String {
    fn into_name(self) -> LogResult<Option<String>> {
        Ok(Some(self.clone()))
    }
}

impl<T: NameArg> NameArg for Option<T> {
    fn into_name(self) -> LogResult<Option<String>> {
        match self {
            Some(name) => name.into_name(),
            None => Ok(None),
        }
    }
}

impl NameArg for &toml::Value {
    fn into_name(self) -> LogResult<Option<String>> {
        match self {
            toml::Value::String(name) => Ok(Some(name.clone())),
            other => Err(LogError::name_type(other.type_str())),
        }
    }
}

/// A logger held by the session registry.
#[derive(Debug, Clone)]
pub enum Registered {
    /// Created by [`Session::add_child_logger`].
    Child(Arc<Logger>),
    /// Created by [`Session::add_instance_logger`].
    Instance(Arc<InstanceLogger>),
}

impl Registered {
    /// Registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.logger().name()
    }

    /// The underlying logger.
    #[must_use]
    pub fn logger(&self) -> &Arc<Logger> {
        match self {
            Registered::Child(logger) => logger,
            Registered::Instance(instance) => instance.logger(),
        }
    }

    /// The instance logger, if this is one.
    #[must_use]
    pub fn as_instance(&self) -> Option<&Arc<InstanceLogger>> {
        match self {
            Registered::Instance(instance) => Some(instance),
            Registered::Child(_) => None,
        }
    }
}

impl Emit for Registered {
    fn emit(&self, severity: Severity, site: CallSite, message: fmt::Arguments<'_>) {
        match self {
            Registered::Child(logger) => logger.emit(severity, site, message),
            Registered::Instance(instance) => instance.emit(severity, site, message),
        }
    }
}

#[derive(Default)]
struct Registry {
    entries: HashMap<String, Registered>,
    order: Vec<String>,
    namespace: HashSet<String>,
}

impl Registry {
    fn insert(&mut self, name: String, entry: Registered) {
        self.namespace.insert(name.clone());
        self.order.push(name.clone());
        self.entries.insert(name, entry);
    }

    fn vacant_name(&self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut count = 0_usize;
        while self.namespace.contains(&candidate) {
            count += 1;
            candidate = format!("{base}_{count}");
        }
        candidate
    }
}

/// The root logger and everything derived from it.
///
/// Dereferences to the root [`Logger`].
pub struct Session {
    root: Arc<Logger>,
    registry: Mutex<Registry>,
    cleanup: bool,
    hook: Mutex<Option<PanicHook>>,
}

impl Session {
    /// Start building a session.
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Build a session from `config`.
    pub fn from_config(config: LoggerConfig) -> LogResult<Self> {
        SessionBuilder::new().config(config).build()
    }

    /// Build a session configured from environment variables.
    pub fn from_env() -> LogResult<Self> {
        Self::from_config(LoggerConfig::from_env()?)
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn hook_slot(&self) -> MutexGuard<'_, Option<PanicHook>> {
        self.hook.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The root logger.
    #[must_use]
    pub fn root(&self) -> &Arc<Logger> {
        &self.root
    }

    /// Whether dropping the session closes its sinks.
    #[must_use]
    pub fn cleanup(&self) -> bool {
        self.cleanup
    }

    /// Create (or fetch) the child logger `<root>.<suffix>`.
    ///
    /// A new child copies the root's sinks; see [`Logger`] for how `level`
    /// adjusts them. Asking again for an existing child returns it as is.
    pub fn add_child_logger(
        &self,
        suffix: impl NameArg,
        level: Option<Severity>,
    ) -> LogResult<Arc<Logger>> {
        let suffix = suffix
            .into_name()?
            .ok_or_else(|| LogError::name_type("none"))?;
        let name = format!("{}.{suffix}", self.root.name());

        let mut registry = self.registry();
        match registry.entries.get(&name) {
            Some(Registered::Child(existing)) => return Ok(Arc::clone(existing)),
            Some(Registered::Instance(_)) => {
                return Err(LogError::invalid_config(format!(
                    "'{name}' is already registered as an instance logger"
                )));
            }
            None => {}
        }

        let child = Arc::new(self.root.derive_child(name.clone(), level));
        registry.insert(name.clone(), Registered::Child(Arc::clone(&child)));
        log::debug!(target: targets::SESSION, "registered child logger '{}'", name);
        Ok(child)
    }

    /// Create an instance logger bound to `instance`.
    ///
    /// Without a name the logger is called [`UNNAMED_INSTANCE`]. A name that
    /// is already taken in this session gets `_1`, `_2`, ... appended.
    pub fn add_instance_logger<T>(
        &self,
        name: impl NameArg,
        instance: &Arc<T>,
        level: Option<Severity>,
    ) -> LogResult<Arc<InstanceLogger>>
    where
        T: DisplayName + Send + Sync + 'static,
    {
        let base = name
            .into_name()?
            .unwrap_or_else(|| UNNAMED_INSTANCE.to_string());

        let mut registry = self.registry();
        let name = registry.vacant_name(&base);
        let logger = Arc::new(self.root.derive_child(name.clone(), level));
        let instance_logger = Arc::new(InstanceLogger::new(logger, instance));
        registry.insert(
            name.clone(),
            Registered::Instance(Arc::clone(&instance_logger)),
        );
        log::debug!(target: targets::SESSION, "registered instance logger '{}'", name);
        Ok(instance_logger)
    }

    /// Look up a registered logger by its full name.
    pub fn get(&self, key: &str) -> LogResult<Registered> {
        self.registry()
            .entries
            .get(key)
            .cloned()
            .ok_or_else(|| LogError::not_found(key))
    }

    /// Registered names in creation order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.registry().order.clone()
    }

    /// Route uncaught panics to the root logger. Returns `false` when the
    /// hook was already installed.
    pub fn install_panic_hook(&self) -> bool {
        let mut slot = self.hook_slot();
        if slot.is_some() {
            return false;
        }
        *slot = Some(PanicHook::install(&self.root));
        true
    }

    /// Stop routing panics to the root logger. Hooks of other sessions stay
    /// in place. Returns `false` when none was installed.
    pub fn uninstall_panic_hook(&self) -> bool {
        match self.hook_slot().take() {
            Some(hook) => {
                hook.uninstall();
                true
            }
            None => false,
        }
    }

    /// Whether the panic hook is installed.
    #[must_use]
    pub fn panic_hook_installed(&self) -> bool {
        self.hook_slot().is_some()
    }
}

impl Deref for Session {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.root
    }
}

impl Emit for Session {
    fn emit(&self, severity: Severity, site: CallSite, message: fmt::Arguments<'_>) {
        self.root.emit(severity, site, message);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.uninstall_panic_hook();

        if !self.cleanup {
            log::debug!(
                target: targets::TEARDOWN,
                "cleanup disabled; leaving sinks of '{}' open",
                self.root.name()
            );
            return;
        }

        let registry = std::mem::take(&mut *self.registry());
        let mut closed = self.root.close();
        for name in &registry.order {
            if let Some(entry) = registry.entries.get(name) {
                closed += entry.logger().close();
            }
        }
        log::debug!(
            target: targets::TEARDOWN,
            "session '{}' closed {} file sink(s)",
            self.root.name(),
            closed
        );
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("root", &self.root)
            .field("names", &self.names())
            .field("cleanup", &self.cleanup)
            .field("panic_hook", &self.panic_hook_installed())
            .finish()
    }
}

/// Builder for [`Session`].
///
/// Starts from [`LoggerConfig::default`].
#[derive(Default)]
pub struct SessionBuilder {
    config: LoggerConfig,
    console_writer: Option<SharedWriter>,
}

impl SessionBuilder {
    /// Create a builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    /// Root threshold.
    #[must_use]
    pub fn level(mut self, level: Severity) -> Self {
        self.config.level = level;
        self
    }

    /// Attach a file sink.
    #[must_use]
    pub fn to_file(mut self, enabled: bool) -> Self {
        self.config.to_file = enabled;
        self
    }

    /// Attach a console sink.
    #[must_use]
    pub fn to_stdout(mut self, enabled: bool) -> Self {
        self.config.to_stdout = enabled;
        self
    }

    /// Log file path; a non-default path enables the file sink.
    #[must_use]
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.file_path = path.into();
        self
    }

    /// Close sinks when the session is dropped.
    #[must_use]
    pub fn cleanup(mut self, enabled: bool) -> Self {
        self.config.cleanup = enabled;
        self
    }

    /// Root logger name.
    #[must_use]
    pub fn root_name(mut self, name: impl Into<String>) -> Self {
        self.config.root_name = name.into();
        self
    }

    /// Install the panic hook at build time.
    #[must_use]
    pub fn panic_hook(mut self, enabled: bool) -> Self {
        self.config.install_panic_hook = enabled;
        self
    }

    /// Write console output to `writer` instead of standard output.
    /// Turns the console sink on.
    #[must_use]
    pub fn console_writer<W>(mut self, writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        let writer: Box<dyn Write + Send> = Box::new(writer);
        self.console_writer = Some(Arc::new(Mutex::new(writer)));
        self.config.to_stdout = true;
        self
    }

    /// Write the column header when the console sink is attached.
    #[must_use]
    pub fn console_header(mut self, enabled: bool) -> Self {
        self.config.console_header = enabled;
        self
    }

    /// Line template for every sink.
    #[must_use]
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.config.template = template.into();
        self
    }

    /// Build the session: root logger, file sink, console sink, configured
    /// children, then the panic hook.
    pub fn build(self) -> LogResult<Session> {
        let Self {
            config,
            console_writer,
        } = self;

        let formatter = LineFormatter::new(&config.template)?;
        let root = Arc::new(Logger::with_formatter(
            config.root_name.clone(),
            config.level,
            formatter,
        ));

        if config.file_sink_enabled() {
            root.log_to_file(&config.file_path, None)?;
        }
        if config.to_stdout {
            root.attach_console(None, console_writer, config.console_header)?;
        }

        let mut namespace = HashSet::new();
        namespace.insert(config.root_name.clone());
        let session = Session {
            root,
            registry: Mutex::new(Registry {
                namespace,
                ..Registry::default()
            }),
            cleanup: config.cleanup,
            hook: Mutex::new(None),
        };

        for child in &config.children {
            session.add_child_logger(&child.suffix, child.severity()?)?;
        }
        if config.install_panic_hook {
            session.install_panic_hook();
        }

        log::debug!(
            target: targets::SESSION,
            "session '{}' started at {}",
            session.root.name(),
            config.level
        );
        Ok(session)
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("console_writer", &self.console_writer.is_some())
            .finish()
    }
}
