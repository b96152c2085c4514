//! Domain-level error taxonomy.
//!
//! These errors are transport agnostic. Every failure the core produces is a
//! [`DomainError`] tagged with an [`ErrorKind`]; the kind fixes the HTTP status
//! and the stable code, so the two can never disagree. Inbound adapters
//! dispatch on the kind when rendering responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Default message for [`ErrorKind::Auth`] when none is supplied.
pub const DEFAULT_AUTH_MESSAGE: &str = "Authentication required";
/// Default message for [`ErrorKind::Forbidden`] when none is supplied.
pub const DEFAULT_FORBIDDEN_MESSAGE: &str = "Insufficient permissions";

/// Failure category of a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// One or more input fields failed validation.
    Validation,
    /// The request is malformed.
    BadRequest,
    /// Authentication failed or is missing.
    Auth,
    /// Authenticated but not permitted to perform this action.
    Forbidden,
    /// The requested resource does not exist.
    NotFound,
    /// The request conflicts with existing state.
    Conflict,
    /// An unexpected failure inside the service or a dependency.
    Internal,
}

impl ErrorKind {
    /// HTTP status paired with this kind.
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Validation | Self::BadRequest => 400,
            Self::Auth => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }

    /// Stable machine-readable code paired with this kind.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",
            Self::Auth => "AUTHENTICATION_ERROR",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

/// One failing input field.
///
/// Produced only by the field validation collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    #[schema(example = "email")]
    field: String,
    #[schema(example = "Invalid email format")]
    message: String,
    /// Offending raw value; absent when the field was missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    value: Option<Value>,
}

impl FieldError {
    /// Build a field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    /// Name of the failing field.
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Why the field failed.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Raw value that failed, if the field was present.
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// Domain error payload.
///
/// ## Invariants
/// - `kind`, `http_status()` and `code()` always agree; the latter two are
///   derived from the kind and cannot be set independently.
/// - `field_errors` is only ever non-empty for [`ErrorKind::Validation`].
///
/// # Examples
/// ```
/// use orgadmin::domain::{DomainError, ErrorKind};
///
/// let err = DomainError::not_found("member 42 not found");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert_eq!(err.http_status(), 404);
/// assert_eq!(err.code(), "NOT_FOUND");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DomainError {
    kind: ErrorKind,
    message: String,
    field_errors: Vec<FieldError>,
    diagnostic: Option<String>,
}

impl DomainError {
    fn with_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field_errors: Vec::new(),
            diagnostic: None,
        }
    }

    fn or_default_message(message: impl Into<String>, fallback: &str) -> String {
        let message = message.into();
        if message.trim().is_empty() {
            fallback.to_owned()
        } else {
            message
        }
    }

    /// Validation failure carrying per-field detail, in declaration order.
    ///
    /// # Examples
    /// ```
    /// use orgadmin::domain::{DomainError, FieldError};
    ///
    /// let err = DomainError::validation(
    ///     "Validation failed",
    ///     vec![FieldError::new("name", "Field is required", None)],
    /// );
    /// assert_eq!(err.field_errors().len(), 1);
    /// assert_eq!(err.http_status(), 400);
    /// ```
    pub fn validation(message: impl Into<String>, field_errors: Vec<FieldError>) -> Self {
        Self {
            field_errors,
            ..Self::with_kind(ErrorKind::Validation, message)
        }
    }

    /// Convenience constructor for [`ErrorKind::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::BadRequest, message)
    }

    /// Convenience constructor for [`ErrorKind::Auth`].
    ///
    /// A blank message falls back to [`DEFAULT_AUTH_MESSAGE`].
    pub fn auth(message: impl Into<String>) -> Self {
        Self::with_kind(
            ErrorKind::Auth,
            Self::or_default_message(message, DEFAULT_AUTH_MESSAGE),
        )
    }

    /// [`ErrorKind::Auth`] with the default message.
    pub fn auth_required() -> Self {
        Self::auth(DEFAULT_AUTH_MESSAGE)
    }

    /// Convenience constructor for [`ErrorKind::Forbidden`].
    ///
    /// A blank message falls back to [`DEFAULT_FORBIDDEN_MESSAGE`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_kind(
            ErrorKind::Forbidden,
            Self::or_default_message(message, DEFAULT_FORBIDDEN_MESSAGE),
        )
    }

    /// [`ErrorKind::Forbidden`] with the default message.
    pub fn insufficient_permissions() -> Self {
        Self::forbidden(DEFAULT_FORBIDDEN_MESSAGE)
    }

    /// Convenience constructor for [`ErrorKind::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::NotFound, message)
    }

    /// Convenience constructor for [`ErrorKind::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Conflict, message)
    }

    /// Convenience constructor for [`ErrorKind::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Internal, message)
    }

    /// Attach server-side diagnostic context (cause chain, raw payloads).
    ///
    /// Diagnostic text is logged but never rendered to clients.
    pub fn with_diagnostic(mut self, diagnostic: impl Into<String>) -> Self {
        self.diagnostic = Some(diagnostic.into());
        self
    }

    /// Failure category.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status derived from the kind.
    pub fn http_status(&self) -> u16 {
        self.kind.http_status()
    }

    /// Stable machine-readable code derived from the kind.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Field-level failures; empty for every kind but validation.
    pub fn field_errors(&self) -> &[FieldError] {
        self.field_errors.as_slice()
    }

    /// Server-side diagnostic context, if any was attached.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DomainError {}
