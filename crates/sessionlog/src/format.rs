//! Line formatting and session headers.
//!
//! A [`LineFormatter`] turns one [`LogRecord`] into one line of text. The
//! template is parsed once at construction; rendering only substitutes the
//! parsed fields, so the record's message is copied verbatim even when it
//! contains brace sequences of its own.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Local};
use sessionlog_core::{LogError, LogRecord, LogResult};

/// Default line template.
pub const DEFAULT_TEMPLATE: &str = "{level} - {instance_name} - {module} - {function} - {message}";

/// Column header written under the session banner.
pub const COLUMN_HEADER: &str = "LEVEL - INSTANCE NAME - MODULE - FUNCTION - MESSAGE";

/// Width of the `=` rule framing the session banner.
pub const RULE_WIDTH: usize = 79;

const ASCTIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SESSION_TIME_FORMAT: &str = "%m/%d/%Y, %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Level,
    InstanceName,
    Module,
    Function,
    Message,
    Logger,
    AscTime,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "level" => Some(Field::Level),
            "instance_name" => Some(Field::InstanceName),
            "module" => Some(Field::Module),
            "function" => Some(Field::Function),
            "message" => Some(Field::Message),
            "logger" => Some(Field::Logger),
            "asctime" => Some(Field::AscTime),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

#[derive(Debug)]
struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    fn parse(source: &str) -> LogResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => name.push(c),
                            None => {
                                return Err(LogError::invalid_config(format!(
                                    "unclosed placeholder in template '{source}'"
                                )));
                            }
                        }
                    }
                    let field = Field::parse(name.trim()).ok_or_else(|| {
                        LogError::invalid_config(format!("unknown placeholder '{{{name}}}'"))
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(LogError::invalid_config(format!(
                        "unmatched '}}' in template '{source}'"
                    )));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }
}

/// Renders records into single lines.
///
/// Clones share the parsed template.
#[derive(Debug, Clone)]
pub struct LineFormatter {
    template: Arc<Template>,
}

impl LineFormatter {
    /// Parse a template.
    ///
    /// Placeholders: `{level}`, `{instance_name}`, `{module}`, `{function}`,
    /// `{message}`, `{logger}`, `{asctime}`. Use `{{` and `}}` for literal
    /// braces.
    pub fn new(template: &str) -> LogResult<Self> {
        Ok(Self {
            template: Arc::new(Template::parse(template)?),
        })
    }

    /// The template this formatter was built from.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template.source
    }

    /// Render a record. Does not append a newline.
    #[must_use]
    pub fn format(&self, record: &LogRecord) -> String {
        let mut line = String::with_capacity(64 + record.message.len());
        for segment in &self.template.segments {
            match segment {
                Segment::Literal(text) => line.push_str(text),
                Segment::Field(Field::Level) => line.push_str(record.severity.as_str()),
                Segment::Field(Field::InstanceName) => line.push_str(&record.instance_name),
                Segment::Field(Field::Module) => line.push_str(&record.module),
                Segment::Field(Field::Function) => line.push_str(&record.function),
                Segment::Field(Field::Message) => line.push_str(&record.message),
                Segment::Field(Field::Logger) => line.push_str(&record.logger_name),
                Segment::Field(Field::AscTime) => {
                    let _ = write!(line, "{}", record.timestamp.format(ASCTIME_FORMAT));
                }
            }
        }
        line
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self {
            template: Arc::new(Template {
                source: DEFAULT_TEMPLATE.to_string(),
                segments: vec![
                    Segment::Field(Field::Level),
                    Segment::Literal(" - ".into()),
                    Segment::Field(Field::InstanceName),
                    Segment::Literal(" - ".into()),
                    Segment::Field(Field::Module),
                    Segment::Literal(" - ".into()),
                    Segment::Field(Field::Function),
                    Segment::Literal(" - ".into()),
                    Segment::Field(Field::Message),
                ],
            }),
        }
    }
}

/// Preambles written when a sink is attached.
pub struct SessionHeader;

impl SessionHeader {
    /// The five-line file preamble: blank line, rule, session banner, rule,
    /// column header. Ends with a newline.
    #[must_use]
    pub fn file_preamble(started: DateTime<Local>) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!(
            "\n{rule}\nNEW SESSION - {}\n{rule}\n{COLUMN_HEADER}\n",
            started.format(SESSION_TIME_FORMAT)
        )
    }

    /// The console preamble: blank line then the column header.
    #[must_use]
    pub fn console_preamble() -> String {
        format!("\n{COLUMN_HEADER}\n")
    }
}
