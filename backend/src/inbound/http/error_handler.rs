//! Terminal error handler for HTTP requests.
//!
//! Every failure raised while answering a request ends here. The handler
//! writes exactly one log entry with the full detail, picks the severity from
//! the error kind and builds the client reply, disclosing only what is safe
//! for that kind. Stacks and diagnostics never reach the client.

use std::any::type_name;
use std::error::Error as StdError;
use std::sync::Arc;

use serde_json::{Value, json};

use super::error::ErrorReply;
use super::request_context::RequestContext;
use crate::domain::external_error::raw_body;
use crate::domain::ports::{DiagnosticLog, LogFields, log_fields};
use crate::domain::{
    CorrelationId, DomainError, ErrorKind, ExternalErrorMapper, ExternalServiceFailure,
};

/// Message returned for failures that did not come through the taxonomy.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// A failure that was never classified into a [`DomainError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFailure {
    type_name: String,
    message: String,
    stack: Option<String>,
}

impl UnknownFailure {
    /// Describe an arbitrary failure by hand.
    pub fn new(
        type_name: impl Into<String>,
        message: impl Into<String>,
        stack: Option<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            stack,
        }
    }

    /// Capture an error value, its type name and its cause chain.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: StdError + 'static,
    {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        let stack = (!chain.is_empty()).then(|| chain.join("\ncaused by: "));
        Self::new(type_name::<E>(), error.to_string(), stack)
    }

    /// Name of the failure's type.
    pub fn type_name(&self) -> &str {
        self.type_name.as_str()
    }

    /// Raw message. Logged, never sent to clients.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Cause chain or backtrace, when available.
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl From<color_eyre::Report> for UnknownFailure {
    fn from(report: color_eyre::Report) -> Self {
        // The debug rendering carries the cause chain and any captured
        // backtrace or span trace.
        Self::new(
            type_name::<color_eyre::Report>(),
            report.to_string(),
            Some(format!("{report:?}")),
        )
    }
}

/// Anything the error handler can be asked to answer.
#[derive(Debug)]
pub enum Failure {
    /// Classified failure.
    Domain(DomainError),
    /// Raw identity service failure that nobody mapped yet. Classified
    /// without a separate mapper entry; its status and body join the
    /// handler's entry.
    External(ExternalServiceFailure),
    /// Failure outside the taxonomy.
    Unknown(UnknownFailure),
}

impl From<DomainError> for Failure {
    fn from(error: DomainError) -> Self {
        Self::Domain(error)
    }
}

impl From<ExternalServiceFailure> for Failure {
    fn from(failure: ExternalServiceFailure) -> Self {
        Self::External(failure)
    }
}

impl From<UnknownFailure> for Failure {
    fn from(failure: UnknownFailure) -> Self {
        Self::Unknown(failure)
    }
}

impl From<color_eyre::Report> for Failure {
    fn from(report: color_eyre::Report) -> Self {
        Self::Unknown(report.into())
    }
}

/// Turns failures into logged, client-safe replies.
pub struct ErrorHandler {
    mapper: ExternalErrorMapper,
    log: Arc<dyn DiagnosticLog>,
}

impl ErrorHandler {
    /// Build a handler mapping raw identity failures with `mapper`.
    pub fn new(mapper: ExternalErrorMapper, log: Arc<dyn DiagnosticLog>) -> Self {
        Self { mapper, log }
    }

    /// Log `failure` once and build the reply for the client.
    ///
    /// A fresh [`CorrelationId`] is generated for every call and written to
    /// the log entry. Only internal and unknown failures disclose it.
    pub fn handle(&self, failure: Failure, context: &RequestContext) -> ErrorReply {
        let correlation_id = CorrelationId::generate();
        match failure {
            Failure::Domain(error) => {
                let fields = request_fields(correlation_id, context);
                self.handle_domain(&error, fields, correlation_id)
            }
            Failure::External(raw) => {
                let error = self.mapper.classify(&raw);
                let mut fields = request_fields(correlation_id, context);
                fields.insert("externalStatus".to_owned(), Value::from(raw.status()));
                fields.insert("externalBody".to_owned(), raw_body(&raw));
                self.handle_domain(&error, fields, correlation_id)
            }
            Failure::Unknown(unknown) => self.handle_unknown(&unknown, context, correlation_id),
        }
    }

    fn handle_domain(
        &self,
        error: &DomainError,
        mut fields: LogFields,
        correlation_id: CorrelationId,
    ) -> ErrorReply {
        fields.insert("message".to_owned(), Value::from(error.message()));
        let reply = ErrorReply::new(error.http_status(), error.code(), error.message());

        match error.kind() {
            ErrorKind::Validation => {
                fields.insert(
                    "fieldErrors".to_owned(),
                    serde_json::to_value(error.field_errors()).unwrap_or(Value::Null),
                );
                self.log.warn("Request failed validation", fields);
                reply.with_details(error.field_errors().to_vec())
            }
            ErrorKind::NotFound => {
                self.log.info("Resource not found", fields);
                reply
            }
            ErrorKind::BadRequest | ErrorKind::Auth | ErrorKind::Forbidden | ErrorKind::Conflict => {
                fields.insert("httpStatus".to_owned(), Value::from(error.http_status()));
                self.log.warn("Request rejected", fields);
                reply
            }
            ErrorKind::Internal => {
                fields.insert("httpStatus".to_owned(), Value::from(error.http_status()));
                fields.insert("stack".to_owned(), Value::from(error.diagnostic()));
                self.log.error("Internal error", fields);
                reply.with_correlation_id(correlation_id)
            }
        }
    }

    fn handle_unknown(
        &self,
        unknown: &UnknownFailure,
        context: &RequestContext,
        correlation_id: CorrelationId,
    ) -> ErrorReply {
        let mut fields = request_fields(correlation_id, context);
        fields.insert("message".to_owned(), Value::from(unknown.message()));
        fields.insert("stack".to_owned(), Value::from(unknown.stack()));
        fields.insert("errorType".to_owned(), Value::from(unknown.type_name()));
        self.log.error("Unhandled error", fields);

        ErrorReply::new(
            ErrorKind::Internal.http_status(),
            ErrorKind::Internal.code(),
            UNEXPECTED_ERROR_MESSAGE,
        )
        .with_correlation_id(correlation_id)
    }
}

fn request_fields(correlation_id: CorrelationId, context: &RequestContext) -> LogFields {
    log_fields(json!({
        "correlationId": correlation_id.to_string(),
        "path": context.path(),
        "method": context.method(),
    }))
}
