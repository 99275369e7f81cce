//! `tracing` integration.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use sessionlog_core::{LogRecord, Severity, UNKNOWN_FUNCTION};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use super::{is_internal, module_of};
use crate::logger::Logger;

/// A tracing layer that writes events through a [`Logger`].
///
/// The message field becomes the message, other fields are appended as
/// `key=value`. The innermost span's name is reported as the function.
#[derive(Debug, Clone)]
pub struct SessionLayer {
    logger: Arc<Logger>,
}

impl SessionLayer {
    /// Create a layer writing to `logger`.
    #[must_use]
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

fn severity_of(level: Level) -> Severity {
    match level {
        Level::TRACE | Level::DEBUG => Severity::Debug,
        Level::INFO => Severity::Info,
        Level::WARN => Severity::Warning,
        Level::ERROR => Severity::Error,
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldCollector {
    fn record_value(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            if self.message.is_none() {
                self.message = Some(value);
            }
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }

    fn into_message(self, fallback: &str) -> String {
        let mut message = self.message.unwrap_or_else(|| fallback.to_string());
        for (key, value) in self.fields {
            let _ = write!(message, " {key}={value}");
        }
        message
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, value.to_string());
    }
}

impl<S> Layer<S> for SessionLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let severity = severity_of(*metadata.level());
        if is_internal(metadata.target()) || !self.logger.enabled(severity) {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let function = ctx
            .event_span(event)
            .map_or_else(|| UNKNOWN_FUNCTION.to_string(), |span| span.name().to_string());

        let record = LogRecord {
            severity,
            logger_name: self.logger.name().to_string(),
            module: module_of(metadata.file(), metadata.target()),
            function,
            message: collector.into_message(metadata.name()),
            instance_name: String::new(),
            timestamp: chrono::Local::now(),
        };
        self.logger.log_record(&record);
    }
}
