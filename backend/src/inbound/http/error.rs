//! Client-facing error envelope and its actix response mapping.
//!
//! The envelope only ever carries what the error handler chose to disclose:
//! a stable code, a message, field errors for validation failures and a
//! correlation id for internal failures. Stacks and diagnostics stay in the
//! logs.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::http::header::{self, HeaderName, HeaderValue};
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::domain::{CorrelationId, FieldError};

/// Response header echoing the correlation id of an internal failure.
pub const CORRELATION_ID_HEADER: &str = "correlation-id";

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ErrorReply>;

/// Error details disclosed to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Stable machine-readable code.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: String,
    /// Human-readable message.
    #[schema(example = "Validation failed")]
    pub message: String,
    /// Field errors, present for validation failures only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    /// Support lookup key, present for internal failures only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub correlation_id: Option<String>,
}

/// Body of every error response: `{ "error": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

/// Finished error response: status plus envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReply {
    status: StatusCode,
    envelope: ErrorEnvelope,
}

impl ErrorReply {
    /// Reply with `status` and a body carrying `code` and `message`.
    ///
    /// Unknown status codes fall back to 500.
    pub fn new(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            envelope: ErrorEnvelope {
                error: ErrorBody {
                    code: code.into(),
                    message: message.into(),
                    details: None,
                    correlation_id: None,
                },
            },
        }
    }

    /// Attach field errors.
    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.envelope.error.details = Some(details);
        self
    }

    /// Attach the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.envelope.error.correlation_id = Some(id.to_string());
        self
    }

    /// HTTP status of the reply.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Serialisable body of the reply.
    pub fn envelope(&self) -> &ErrorEnvelope {
        &self.envelope
    }
}

impl fmt::Display for ErrorReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.status.as_u16(),
            self.envelope.error.code,
            self.envelope.error.message
        )
    }
}

impl ResponseError for ErrorReply {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status);
        builder.insert_header((header::CACHE_CONTROL, "no-store"));
        if let Some(id) = self.envelope.error.correlation_id.as_deref() {
            match HeaderValue::from_str(id) {
                Ok(value) => {
                    builder.insert_header((HeaderName::from_static(CORRELATION_ID_HEADER), value));
                }
                Err(header_error) => {
                    error!(%header_error, correlation_id = id, "failed to encode correlation id header");
                }
            }
        }
        builder.json(&self.envelope)
    }
}
