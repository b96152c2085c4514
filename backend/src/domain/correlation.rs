//! Per-error correlation identifier.
//!
//! A `CorrelationId` is generated once per handled error and returned to the
//! client alongside internal failures so support staff can find the matching
//! server log entry. It carries no diagnostic content of its own.

use std::fmt;

use uuid::Uuid;

/// Opaque identifier tying a client-facing error to its log entry.
///
/// # Examples
/// ```
/// use orgadmin::domain::CorrelationId;
///
/// let first = CorrelationId::generate();
/// let second = CorrelationId::generate();
/// assert_ne!(first, second);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CorrelationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
