//! `tracing`-backed diagnostic log.
//!
//! Each call becomes exactly one `tracing` event at the matching level. The
//! structured fields are rendered as a JSON object under the `fields` key so
//! the JSON subscriber emits them verbatim.

use serde_json::Value;
use tracing::{error, info, warn};

use crate::domain::ports::{DiagnosticLog, LogFields};

/// Diagnostic log forwarding to the global `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnosticLog;

impl DiagnosticLog for TracingDiagnosticLog {
    fn info(&self, message: &str, fields: LogFields) {
        let fields = Value::Object(fields);
        info!(%fields, "{message}");
    }

    fn warn(&self, message: &str, fields: LogFields) {
        let fields = Value::Object(fields);
        warn!(%fields, "{message}");
    }

    fn error(&self, message: &str, fields: LogFields) {
        let fields = Value::Object(fields);
        error!(%fields, "{message}");
    }
}
