//! Port for user records held by the external identity store.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Identifier the identity store assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityUserId(String);

impl IdentityUserId {
    /// Wrap a raw identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for IdentityUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record to create in the identity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentityUser {
    pub username: String,
    pub email: String,
    pub display_name: String,
}

/// Identity store operations used by member administration.
///
/// Adapters run every call through the authenticated operation runner, so
/// failures arrive already mapped into the domain taxonomy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Create a user and return the identifier the store assigned.
    async fn create_user(&self, user: &NewIdentityUser) -> Result<IdentityUserId, DomainError>;

    /// Delete a user. Used as the compensating action of enrolment.
    async fn delete_user(&self, id: &IdentityUserId) -> Result<(), DomainError>;
}
