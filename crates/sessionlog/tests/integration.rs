//! Integration tests for sessionlog sessions.
//!
//! These tests drive the public API end to end:
//! - Console and file sink output
//! - Child and instance loggers derived from a session
//! - Registry lookups and name handling
//! - Configuration and teardown

use std::fs;
use std::sync::{Arc, Mutex};

use regex::Regex;
use sessionlog::testing::CaptureBuffer;
use sessionlog::{
    DisplayName, Emit, ErrorKind, LogError, LoggerConfig, Registered, Session, Severity, SinkKind,
};
use tempfile::TempDir;

struct Product {
    name: Mutex<String>,
}

impl Product {
    fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: Mutex::new(name.to_string()),
        })
    }

    fn rename(&self, name: &str) {
        *self.name.lock().unwrap() = name.to_string();
    }
}

impl DisplayName for Product {
    fn display_name(&self) -> String {
        self.name.lock().unwrap().clone()
    }
}

fn console_session(level: Severity) -> (Session, CaptureBuffer) {
    let capture = CaptureBuffer::new();
    let session = Session::builder()
        .level(level)
        .panic_hook(false)
        .console_writer(capture.writer())
        .build()
        .unwrap();
    (session, capture)
}

// ============================================================================
// Console Output
// ============================================================================

#[test]
fn console_only_info_session() {
    let (session, capture) = console_session(Severity::Info);

    sessionlog::debug!(session, "x");
    sessionlog::info!(session, "y");

    assert_eq!(
        capture.output(),
        vec!["INFO -  - integration - console_only_info_session - y"]
    );
}

#[test]
fn plain_methods_report_unknown_function() {
    let (session, capture) = console_session(Severity::Debug);
    session.warning("careful");
    capture.assert_contains("WARNING -  - integration - <unknown> - careful");
}

#[test]
fn message_braces_are_written_verbatim() {
    let (session, capture) = console_session(Severity::Debug);
    session.info("{level} {{}} {missing}");
    capture.assert_contains(" - {level} {{}} {missing}");
}

#[test]
fn custom_template_applies_to_every_sink() {
    let capture = CaptureBuffer::new();
    let session = Session::builder()
        .panic_hook(false)
        .template("[{logger}] {level}: {message}")
        .console_writer(capture.writer())
        .build()
        .unwrap();
    let child = session.add_child_logger("db", None).unwrap();

    child.error("down");
    capture.assert_contains("[pyproject_global.db] ERROR: down");
}

// ============================================================================
// File Output
// ============================================================================

#[test]
fn file_session_writes_header_then_records() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("run.log");
    let session = Session::builder()
        .level(Severity::Debug)
        .panic_hook(false)
        .to_stdout(false)
        .file_path(&path)
        .build()
        .unwrap();

    sessionlog::info!(session, "hello");
    drop(session);

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    let rule = "=".repeat(79);

    assert_eq!(lines.len(), 6, "unexpected file content:\n{content}");
    assert_eq!(lines[0], "");
    assert_eq!(lines[1], rule);
    assert!(
        Regex::new(r"^NEW SESSION - \d{2}/\d{2}/\d{4}, \d{2}:\d{2}:\d{2}$")
            .unwrap()
            .is_match(lines[2]),
        "bad banner: {}",
        lines[2]
    );
    assert_eq!(lines[3], rule);
    assert_eq!(lines[4], "LEVEL - INSTANCE NAME - MODULE - FUNCTION - MESSAGE");
    assert_eq!(
        lines[5],
        "INFO -  - integration - file_session_writes_header_then_records - hello"
    );
}

#[test]
fn file_is_appended_across_sessions() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("append.log");

    for message in ["first", "second"] {
        let session = Session::builder()
            .panic_hook(false)
            .to_stdout(false)
            .file_path(&path)
            .build()
            .unwrap();
        session.info(message);
    }

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("NEW SESSION - ").count(), 2);
    assert!(content.find("first").unwrap() < content.find("second").unwrap());
}

#[test]
fn file_and_console_filter_independently() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("split.log");
    let (session, capture) = console_session(Severity::Debug);
    session.log_to_file(&path, Some(Severity::Error)).unwrap();

    session.info("console only");
    session.error("both");

    capture.assert_contains("console only");
    capture.assert_contains("both");
    let content = fs::read_to_string(&path).unwrap();
    assert!(!content.contains("console only"));
    assert!(content.contains("ERROR -  - integration - <unknown> - both"));
}

#[test]
fn unopenable_file_is_an_io_error() {
    let temp = TempDir::new().unwrap();
    let err = Session::builder()
        .panic_hook(false)
        .to_stdout(false)
        .file_path(temp.path().join("missing-dir").join("x.log"))
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

// ============================================================================
// Sink Attachment
// ============================================================================

#[test]
fn double_stdout_attachment_is_rejected() {
    let (session, _capture) = console_session(Severity::Debug);
    let before = session.sinks();

    let err = session.log_to_stdout(None).unwrap_err();

    assert!(matches!(
        err,
        LogError::AlreadyAttached {
            kind: SinkKind::Console,
            ..
        }
    ));
    assert_eq!(session.sinks(), before);
}

#[test]
fn set_level_cascades_to_sinks() {
    let temp = TempDir::new().unwrap();
    let (session, _capture) = console_session(Severity::Debug);
    session.log_to_file(temp.path().join("l.log"), Some(Severity::Critical)).unwrap();

    session.set_level(Severity::Warning);

    assert!(session.sinks().iter().all(|s| s.threshold == Severity::Warning));
    assert_eq!(session.level(), Severity::Warning);
}

// ============================================================================
// Child And Instance Loggers
// ============================================================================

#[test]
fn instance_logger_reads_name_per_call() {
    let (session, capture) = console_session(Severity::Debug);
    let product = Product::new("foo");
    let logger = session.add_instance_logger("svc", &product, None).unwrap();

    logger.info("m");
    product.rename("bar");
    logger.info("m2");

    assert_eq!(
        capture.output(),
        vec![
            "INFO - foo - integration - <unknown> - m",
            "INFO - bar - integration - <unknown> - m2",
        ]
    );
}

#[test]
fn instance_name_collisions_are_deterministic() {
    let (session, _capture) = console_session(Severity::Debug);
    let product = Product::new("p");

    let first = session.add_instance_logger("x", &product, None).unwrap();
    let second = session.add_instance_logger("x", &product, None).unwrap();

    assert_eq!(first.name(), "x");
    assert_eq!(second.name(), "x_1");
    assert_eq!(session.names(), vec!["x", "x_1"]);
}

#[test]
fn instance_logger_with_macros_records_function() {
    let (session, capture) = console_session(Severity::Debug);
    let product = Product::new("widget");
    let logger = session.add_instance_logger("w", &product, None).unwrap();

    sessionlog::error!(logger, "failed after {} tries", 3);
    capture.assert_contains(
        "ERROR - widget - integration - instance_logger_with_macros_records_function - failed after 3 tries",
    );
}

#[test]
fn child_inherits_root_level_and_sinks() {
    let (session, capture) = console_session(Severity::Warning);
    let child = session.add_child_logger("net", None).unwrap();

    child.info("dropped");
    child.warning("kept");

    assert_eq!(child.level(), Severity::Warning);
    capture.assert_not_contains("dropped");
    capture.assert_contains("WARNING -  - integration - <unknown> - kept");
}

#[test]
fn child_level_overrides_only_its_own_sinks() {
    let (session, capture) = console_session(Severity::Error);
    let child = session.add_child_logger("chatty", Some(Severity::Info)).unwrap();

    child.info("child info");
    session.info("root info");

    capture.assert_contains("child info");
    capture.assert_not_contains("root info");
    assert_eq!(session.sinks()[0].threshold, Severity::Error);
}

#[test]
fn registry_lookup() {
    let (session, _capture) = console_session(Severity::Debug);
    let product = Product::new("p");
    session.add_child_logger("db", None).unwrap();
    session.add_instance_logger("inst", &product, None).unwrap();

    assert!(matches!(
        session.get("pyproject_global.db").unwrap(),
        Registered::Child(_)
    ));
    assert!(matches!(
        session.get("inst").unwrap(),
        Registered::Instance(_)
    ));

    let err = session.get("ghost").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lookup);
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn dynamic_name_must_be_a_string() {
    let (session, _capture) = console_session(Severity::Debug);
    let product = Product::new("p");
    let value = toml::Value::Boolean(true);

    let err = session.add_instance_logger(&value, &product, None).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NameType);
    assert!(err.to_string().contains("boolean"));
}

// ============================================================================
// Configuration And Teardown
// ============================================================================

#[test]
fn session_from_toml_config() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("svc.log");
    let config = LoggerConfig::from_toml_str(&format!(
        r#"
        level = "warning"
        to_stdout = false
        file_path = {path:?}
        root_name = "svc"
        install_panic_hook = false

        [[children]]
        suffix = "db"
        level = "debug"
        "#,
        path = path.display().to_string()
    ))
    .unwrap();

    let session = Session::from_config(config).unwrap();
    assert_eq!(session.name(), "svc");
    assert!(session.has_sink(SinkKind::File));

    let db = session.get("svc.db").unwrap();
    db.debug("query");
    session.info("not written");
    drop(session);

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("DEBUG -  - integration - <unknown> - query"));
    assert!(!content.contains("not written"));
}

#[test]
fn teardown_releases_file_handles() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("teardown.log");
    let session = Session::builder()
        .panic_hook(false)
        .to_stdout(false)
        .file_path(&path)
        .build()
        .unwrap();
    let child = session.add_child_logger("db", None).unwrap();
    let product = Product::new("p");
    let instance = session.add_instance_logger("i", &product, None).unwrap();

    drop(session);

    assert!(!child.has_sink(SinkKind::File));
    assert!(!instance.logger().has_sink(SinkKind::File));
    assert_eq!(child.close(), 0);
}

#[test]
fn explicit_close_reports_detached_count() {
    let temp = TempDir::new().unwrap();
    let (session, _capture) = console_session(Severity::Debug);
    session.log_to_file(temp.path().join("c.log"), None).unwrap();

    assert_eq!(session.close(), 1);
    assert!(session.has_sink(SinkKind::Console));
}
