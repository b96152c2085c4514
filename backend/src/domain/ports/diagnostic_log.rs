//! Port for structured diagnostic logging.
//!
//! The coordination core never talks to a global logger. It receives a
//! [`DiagnosticLog`] so the host decides where entries go and tests can
//! capture them. Implementations must not panic and must not block the
//! caller for long.

use serde_json::{Map, Value};

/// Structured fields attached to one log entry.
pub type LogFields = Map<String, Value>;

/// Convert a JSON object into [`LogFields`].
///
/// Non-object values are kept under a single `value` key so nothing is lost.
///
/// # Examples
/// ```
/// use orgadmin::domain::ports::log_fields;
/// use serde_json::json;
///
/// let fields = log_fields(json!({ "operation": "create user" }));
/// assert_eq!(fields["operation"], "create user");
/// ```
pub fn log_fields(value: Value) -> LogFields {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_owned(), other);
            map
        }
    }
}

/// Severity-split structured logger.
pub trait DiagnosticLog: Send + Sync {
    /// Record an informational entry.
    fn info(&self, message: &str, fields: LogFields);

    /// Record a warning.
    fn warn(&self, message: &str, fields: LogFields);

    /// Record an error.
    fn error(&self, message: &str, fields: LogFields);
}

/// Severity of a captured entry.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One entry recorded by [`CapturingLog`].
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedEntry {
    pub level: LogLevel,
    pub message: String,
    pub fields: LogFields,
}

/// In-memory logger used by tests to assert on emitted entries.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct CapturingLog {
    entries: std::sync::Mutex<Vec<CapturedEntry>>,
}

#[cfg(any(test, feature = "test-support"))]
impl CapturingLog {
    /// Snapshot of every entry recorded so far.
    pub fn entries(&self) -> Vec<CapturedEntry> {
        self.lock().clone()
    }

    /// Entries recorded at `level`.
    pub fn at(&self, level: LogLevel) -> Vec<CapturedEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.level == level)
            .cloned()
            .collect()
    }

    fn record(&self, level: LogLevel, message: &str, fields: LogFields) {
        self.lock().push(CapturedEntry {
            level,
            message: message.to_owned(),
            fields,
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CapturedEntry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl DiagnosticLog for CapturingLog {
    fn info(&self, message: &str, fields: LogFields) {
        self.record(LogLevel::Info, message, fields);
    }

    fn warn(&self, message: &str, fields: LogFields) {
        self.record(LogLevel::Warn, message, fields);
    }

    fn error(&self, message: &str, fields: LogFields) {
        self.record(LogLevel::Error, message, fields);
    }
}
