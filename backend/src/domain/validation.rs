//! Field validation collector.
//!
//! Runs every declared field validator against an input record and raises a
//! single [`DomainError`] of kind validation carrying one [`FieldError`] per
//! failing field. Validation never stops at the first failure; the order of
//! field errors is the order the rules were declared in.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use super::{DomainError, FieldError};

/// Summary message of the raised validation error.
pub const VALIDATION_FAILED_MESSAGE: &str = "Validation failed";

/// Field validator: `None` passes, `Some(message)` fails.
///
/// The argument is the raw field value, or `None` when the record has no
/// such field.
pub type Validator = Box<dyn Fn(Option<&Value>) -> Option<String> + Send + Sync>;

/// Ordered mapping from field name to validator.
///
/// # Examples
/// ```
/// use orgadmin::domain::validation::{ValidationRules, email, required};
///
/// let rules = ValidationRules::new()
///     .field("name", required())
///     .field("email", email());
/// assert_eq!(rules.len(), 2);
/// ```
#[derive(Default)]
pub struct ValidationRules {
    rules: Vec<(String, Validator)>,
}

impl ValidationRules {
    /// Empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule for `field`.
    pub fn field(mut self, field: impl Into<String>, validator: Validator) -> Self {
        self.rules.push((field.into(), validator));
        self
    }

    /// Number of declared rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rules were declared.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Validate `record` against `rules`.
///
/// `record` is expected to be a JSON object; any other value is treated as a
/// record with no fields.
///
/// # Errors
///
/// Returns a validation [`DomainError`] listing every failing field, each with
/// the offending raw value.
///
/// # Examples
/// ```
/// use orgadmin::domain::validation::{ValidationRules, email, required, validate};
/// use serde_json::json;
///
/// let rules = ValidationRules::new()
///     .field("name", required())
///     .field("email", email());
/// let error = validate(&json!({ "name": "", "email": "bad" }), &rules)
///     .expect_err("both fields fail");
/// assert_eq!(error.field_errors().len(), 2);
/// ```
pub fn validate(record: &Value, rules: &ValidationRules) -> Result<(), DomainError> {
    let field_errors: Vec<FieldError> = rules
        .rules
        .iter()
        .filter_map(|(field, validator)| {
            let value = record.get(field);
            validator(value).map(|message| FieldError::new(field.as_str(), message, value.cloned()))
        })
        .collect();

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(DomainError::validation(
            VALIDATION_FAILED_MESSAGE,
            field_errors,
        ))
    }
}

fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Reject absent, null, or blank values. The only validator that does.
pub fn required() -> Validator {
    Box::new(|value| is_empty(value).then(|| "Field is required".to_owned()))
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
        Regex::new(pattern).unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Require a plausible email address. Empty values are skipped.
pub fn email() -> Validator {
    Box::new(|value| match value {
        Some(raw) if !is_empty(value) => {
            (!email_regex().is_match(&as_text(raw))).then(|| "Invalid email format".to_owned())
        }
        _ => None,
    })
}

/// Require at least `min` characters. Empty values are skipped.
pub fn min_length(min: usize) -> Validator {
    Box::new(move |value| match value {
        Some(raw) if !is_empty(value) => (as_text(raw).chars().count() < min)
            .then(|| format!("Must be at least {min} characters")),
        _ => None,
    })
}

/// Allow at most `max` characters. Empty values are skipped.
pub fn max_length(max: usize) -> Validator {
    Box::new(move |value| match value {
        Some(raw) if !is_empty(value) => (as_text(raw).chars().count() > max)
            .then(|| format!("Must be at most {max} characters")),
        _ => None,
    })
}

/// Require a match against `regex`. Empty values are skipped.
pub fn pattern(regex: Regex, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value| match value {
        Some(raw) if !is_empty(value) => {
            (!regex.is_match(&as_text(raw))).then(|| message.clone())
        }
        _ => None,
    })
}

/// Chain validators for one field, reporting the first failure.
///
/// A field contributes at most one [`FieldError`] however many checks it has.
pub fn all_of(validators: Vec<Validator>) -> Validator {
    Box::new(move |value| validators.iter().find_map(|validator| validator(value)))
}
