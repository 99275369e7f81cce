//! Configuration for a logging session.
//!
//! `LoggerConfig` gathers every option a [`Session`](crate::Session) is built
//! from. It can be filled programmatically, from environment variables, or
//! from a TOML file.

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use sessionlog_core::{LogError, LogResult, Severity};

use crate::format::DEFAULT_TEMPLATE;

/// Root logger name used when none is configured.
pub const DEFAULT_ROOT_NAME: &str = "pyproject_global";

/// Log file used when none is configured.
pub const DEFAULT_FILE: &str = "PyProject.log";

/// Options for building a session
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    /// Root logger threshold
    #[serde(deserialize_with = "severity_field")]
    pub level: Severity,
    /// Attach a file sink
    pub to_file: bool,
    /// Attach a console sink on standard output
    pub to_stdout: bool,
    /// Path of the log file
    pub file_path: PathBuf,
    /// Close sinks when the session is dropped
    pub cleanup: bool,
    /// Name of the root logger
    pub root_name: String,
    /// Install the panic hook at build time
    pub install_panic_hook: bool,
    /// Write the column header when the console sink is attached
    pub console_header: bool,
    /// Line template shared by every sink
    pub template: String,
    /// Child loggers created at build time
    pub children: Vec<ChildSpec>,
}

/// A child logger declared in a config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChildSpec {
    /// Name suffix; must be a string.
    pub suffix: toml::Value,
    /// Threshold name, inherited from the root when absent.
    #[serde(default)]
    pub level: Option<String>,
}

impl ChildSpec {
    /// Parsed threshold.
    pub fn severity(&self) -> LogResult<Option<Severity>> {
        self.level.as_deref().map(str::parse).transpose()
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Severity::Debug,
            to_file: false,
            to_stdout: true,
            file_path: PathBuf::from(DEFAULT_FILE),
            cleanup: true,
            root_name: DEFAULT_ROOT_NAME.to_string(),
            install_panic_hook: true,
            console_header: false,
            template: DEFAULT_TEMPLATE.to_string(),
            children: Vec::new(),
        }
    }
}

impl LoggerConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables
    ///
    /// # Environment Variables
    ///
    /// | Variable | Values | Description |
    /// |----------|--------|-------------|
    /// | `SESSIONLOG_LEVEL` | debug/info/warning/error/critical | Root threshold |
    /// | `SESSIONLOG_TO_FILE` | 0/1 | Attach the file sink |
    /// | `SESSIONLOG_TO_STDOUT` | 0/1 | Attach the console sink |
    /// | `SESSIONLOG_FILE` | path | Log file path |
    /// | `SESSIONLOG_CLEANUP` | 0/1 | Close sinks on drop |
    /// | `SESSIONLOG_ROOT` | name | Root logger name |
    /// | `SESSIONLOG_PANIC_HOOK` | 0/1 | Install the panic hook |
    /// | `SESSIONLOG_CONSOLE_HEADER` | 0/1 | Console column header |
    /// | `SESSIONLOG_FORMAT` | template | Line template |
    pub fn from_env() -> LogResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> LogResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(level) = lookup("SESSIONLOG_LEVEL") {
            config.level = level.parse()?;
        }
        if let Some(val) = lookup("SESSIONLOG_TO_FILE") {
            config.to_file = parse_flag("SESSIONLOG_TO_FILE", &val)?;
        }
        if let Some(val) = lookup("SESSIONLOG_TO_STDOUT") {
            config.to_stdout = parse_flag("SESSIONLOG_TO_STDOUT", &val)?;
        }
        if let Some(path) = lookup("SESSIONLOG_FILE") {
            config.file_path = PathBuf::from(path);
        }
        if let Some(val) = lookup("SESSIONLOG_CLEANUP") {
            config.cleanup = parse_flag("SESSIONLOG_CLEANUP", &val)?;
        }
        if let Some(name) = lookup("SESSIONLOG_ROOT") {
            config.root_name = name;
        }
        if let Some(val) = lookup("SESSIONLOG_PANIC_HOOK") {
            config.install_panic_hook = parse_flag("SESSIONLOG_PANIC_HOOK", &val)?;
        }
        if let Some(val) = lookup("SESSIONLOG_CONSOLE_HEADER") {
            config.console_header = parse_flag("SESSIONLOG_CONSOLE_HEADER", &val)?;
        }
        if let Some(template) = lookup("SESSIONLOG_FORMAT") {
            config.template = template;
        }

        Ok(config)
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> LogResult<Self> {
        toml::from_str(source).map_err(|e| LogError::invalid_config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| LogError::io(path, e))?;
        Self::from_toml_str(&source)
    }

    /// Whether the session gets a file sink.
    ///
    /// A path other than [`DEFAULT_FILE`] turns the file sink on by itself.
    #[must_use]
    pub fn file_sink_enabled(&self) -> bool {
        self.to_file || self.file_path != Path::new(DEFAULT_FILE)
    }
}

fn parse_flag(key: &str, value: &str) -> LogResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(LogError::invalid_config(format!(
            "{key}: expected a boolean, got '{other}'"
        ))),
    }
}

fn severity_field<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, Severity::Debug);
        assert!(!config.to_file);
        assert!(config.to_stdout);
        assert_eq!(config.file_path, PathBuf::from("PyProject.log"));
        assert!(config.cleanup);
        assert_eq!(config.root_name, "pyproject_global");
        assert!(config.install_panic_hook);
        assert!(!config.file_sink_enabled());
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = LoggerConfig::from_lookup(lookup_from(&[
            ("SESSIONLOG_LEVEL", "warning"),
            ("SESSIONLOG_TO_STDOUT", "0"),
            ("SESSIONLOG_TO_FILE", "true"),
            ("SESSIONLOG_ROOT", "app"),
            ("SESSIONLOG_FORMAT", "{level}: {message}"),
        ]))
        .unwrap();

        assert_eq!(config.level, Severity::Warning);
        assert!(!config.to_stdout);
        assert!(config.to_file);
        assert_eq!(config.root_name, "app");
        assert_eq!(config.template, "{level}: {message}");
    }

    #[test]
    fn env_rejects_bad_values() {
        let err =
            LoggerConfig::from_lookup(lookup_from(&[("SESSIONLOG_LEVEL", "loud")])).unwrap_err();
        assert!(err.to_string().contains("loud"));

        let err =
            LoggerConfig::from_lookup(lookup_from(&[("SESSIONLOG_CLEANUP", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("SESSIONLOG_CLEANUP"));
    }

    #[test]
    fn custom_path_enables_file_sink() {
        let config =
            LoggerConfig::from_lookup(lookup_from(&[("SESSIONLOG_FILE", "run.log")])).unwrap();
        assert!(!config.to_file);
        assert!(config.file_sink_enabled());
    }

    #[test]
    fn toml_with_children() {
        let config = LoggerConfig::from_toml_str(
            r#"
            level = "INFO"
            root_name = "svc"
            install_panic_hook = false

            [[children]]
            suffix = "db"
            level = "error"

            [[children]]
            suffix = "http"
            "#,
        )
        .unwrap();

        assert_eq!(config.level, Severity::Info);
        assert_eq!(config.root_name, "svc");
        assert!(!config.install_panic_hook);
        assert_eq!(config.children.len(), 2);
        assert_eq!(config.children[0].suffix.as_str(), Some("db"));
        assert_eq!(config.children[0].severity().unwrap(), Some(Severity::Error));
        assert_eq!(config.children[1].severity().unwrap(), None);
    }

    #[test]
    fn toml_rejects_unknown_level_and_keys() {
        assert!(LoggerConfig::from_toml_str(r#"level = "verbose""#).is_err());
        assert!(LoggerConfig::from_toml_str("colour = true").is_err());
    }

    #[test]
    fn from_file_reports_missing_path() {
        let temp = TempDir::new().unwrap();
        let err = LoggerConfig::from_file(temp.path().join("absent.toml")).unwrap_err();
        assert_eq!(err.kind(), sessionlog_core::ErrorKind::Io);

        let path = temp.path().join("log.toml");
        std::fs::write(&path, "to_file = true\n").unwrap();
        assert!(LoggerConfig::from_file(&path).unwrap().to_file);
    }
}
