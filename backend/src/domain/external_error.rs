//! Failures reported by the external identity service and their mapping into
//! the domain taxonomy.
//!
//! The identity service reports errors in two shapes: an HTTP response whose
//! JSON body carries one of `errorMessage`, `error_description` or `error`,
//! or a flat `{statusCode, message}` pair produced by client-side wrappers.
//! [`ExternalServiceFailure`] models both explicitly; [`ExternalErrorMapper`]
//! turns any failure into exactly one [`DomainError`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::DomainError;
use super::ports::{CredentialError, DiagnosticLog, log_fields};

/// JSON error body returned by the identity service.
///
/// Unknown keys are kept in `extra` so the raw body can be logged in full.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(
        default,
        rename = "errorMessage",
        skip_serializing_if = "Option::is_none"
    )]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExternalErrorBody {
    /// First non-blank message by precedence:
    /// `errorMessage`, then `error_description`, then `error`.
    pub fn message(&self) -> Option<&str> {
        [
            self.error_message.as_deref(),
            self.error_description.as_deref(),
            self.error.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|text| !text.trim().is_empty())
    }
}

/// HTTP response part of an [`ExternalServiceFailure`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalResponse {
    pub status: u16,
    pub body: ExternalErrorBody,
}

/// Raw failure surfaced by an identity service call.
///
/// Short-lived: consumed by [`ExternalErrorMapper::map`] straight away.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExternalServiceFailure {
    response: Option<ExternalResponse>,
    status_code: Option<u16>,
    message: Option<String>,
    stack: Option<String>,
}

impl ExternalServiceFailure {
    /// Failure carrying an HTTP response.
    pub fn with_response(status: u16, body: ExternalErrorBody) -> Self {
        Self {
            response: Some(ExternalResponse { status, body }),
            ..Self::default()
        }
    }

    /// Failure in the flat `{statusCode, message}` shape.
    pub fn flat(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Build a failure from a raw HTTP error response.
    ///
    /// A JSON object body is decoded into [`ExternalErrorBody`]. Any other
    /// non-blank body is kept as the failure message.
    ///
    /// # Examples
    /// ```
    /// use orgadmin::domain::ExternalServiceFailure;
    ///
    /// let failure = ExternalServiceFailure::from_response(
    ///     409,
    ///     br#"{"errorMessage":"User exists with same username"}"#,
    /// );
    /// assert_eq!(failure.status(), Some(409));
    /// ```
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ExternalErrorBody>(body) {
            Ok(parsed) => Self::with_response(status, parsed),
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_owned();
                let failure = Self::with_response(status, ExternalErrorBody::default());
                if text.is_empty() {
                    failure
                } else {
                    failure.with_message(text)
                }
            }
        }
    }

    /// Failure raised before any response arrived (connect, timeout, TLS).
    pub fn transport(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut chain = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        let failure = Self::flat(None, error.to_string());
        if chain.is_empty() {
            failure
        } else {
            failure.with_stack(chain.join("\ncaused by: "))
        }
    }

    /// Attach a top-level message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach diagnostic trace text.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Response status if a response arrived, else the flat status code.
    pub fn status(&self) -> Option<u16> {
        self.response
            .as_ref()
            .map(|response| response.status)
            .or(self.status_code)
    }

    /// Whether the failure reports an expired or missing credential.
    pub fn is_auth_failure(&self) -> bool {
        self.status() == Some(401)
    }

    /// Decoded response body, if a response arrived.
    pub fn body(&self) -> Option<&ExternalErrorBody> {
        self.response.as_ref().map(|response| &response.body)
    }

    /// Top-level message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Diagnostic trace text, if any.
    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl fmt::Display for ExternalServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self
            .body()
            .and_then(ExternalErrorBody::message)
            .or(self.message())
            .unwrap_or("external service failure");
        match self.status() {
            Some(status) => write!(f, "{message} (status {status})"),
            None => f.write_str(message),
        }
    }
}

impl std::error::Error for ExternalServiceFailure {}

impl From<CredentialError> for ExternalServiceFailure {
    fn from(error: CredentialError) -> Self {
        let status = error.status();
        let message = match &error {
            CredentialError::Rejected { message, .. } => message.clone(),
            CredentialError::Transport { .. } | CredentialError::Malformed { .. } => {
                error.to_string()
            }
        };
        Self::flat(status, message)
    }
}

/// Maps identity service failures into [`DomainError`]s.
///
/// The mapping is total: every failure yields exactly one domain error.
#[derive(Clone)]
pub struct ExternalErrorMapper {
    service: String,
    log: Arc<dyn DiagnosticLog>,
}

impl ExternalErrorMapper {
    /// Build a mapper naming `service` in fallback messages.
    pub fn new(service: impl Into<String>, log: Arc<dyn DiagnosticLog>) -> Self {
        Self {
            service: service.into(),
            log,
        }
    }

    /// Name of the service used in messages.
    pub fn service(&self) -> &str {
        self.service.as_str()
    }

    /// Extract the user-facing message by precedence: body `errorMessage`,
    /// body `error_description`, body `error`, failure message, then a
    /// generic `"<service> operation failed"`.
    pub fn message_for(&self, failure: &ExternalServiceFailure) -> String {
        failure
            .body()
            .and_then(ExternalErrorBody::message)
            .or_else(|| failure.message().filter(|text| !text.trim().is_empty()))
            .map_or_else(
                || format!("{} operation failed", self.service),
                str::to_owned,
            )
    }

    /// Map a failure into the domain taxonomy.
    ///
    /// The raw failure is always logged at error severity before mapping.
    pub fn map(&self, failure: ExternalServiceFailure) -> DomainError {
        self.log.error(
            &format!("{} request failed", self.service),
            log_fields(json!({
                "service": self.service,
                "status": failure.status(),
                "message": self.message_for(&failure),
                "body": raw_body(&failure),
                "stack": failure.stack(),
            })),
        );
        self.classify(&failure)
    }

    /// Map a failure without logging it.
    ///
    /// For callers that write their own entry for the failure.
    pub fn classify(&self, failure: &ExternalServiceFailure) -> DomainError {
        let status = failure.status();
        let message = self.message_for(failure);
        let diagnostic = match status {
            Some(status) => format!(
                "{} responded with status {status}: {}",
                self.service,
                raw_body(failure)
            ),
            None => format!("{} call failed without a response", self.service),
        };

        let error = match status {
            Some(400) => DomainError::bad_request(message),
            Some(401) => DomainError::auth(message),
            Some(403) => DomainError::forbidden(message),
            Some(404) => DomainError::not_found(message),
            Some(409) => DomainError::conflict(message),
            Some(422) => DomainError::validation(message, Vec::new()),
            Some(500 | 502 | 503 | 504) => {
                DomainError::internal(format!("{} service error: {message}", self.service))
            }
            _ => DomainError::internal(message),
        };
        error.with_diagnostic(diagnostic)
    }
}

/// Decoded response body as JSON, `null` when no response arrived.
pub(crate) fn raw_body(failure: &ExternalServiceFailure) -> Value {
    failure
        .body()
        .and_then(|body| serde_json::to_value(body).ok())
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests;
