//! Port for member persistence in the local store.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{DomainError, Member, NewMember};

define_port_error! {
    /// Errors raised by member repository adapters.
    pub enum MemberRepositoryError {
        /// A unique column already holds the value.
        Duplicate { field: String } => "member with {field} already exists",
        /// Repository connection could not be established.
        Connection { message: String } => "member repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "member repository query failed: {message}",
    }
}

impl From<MemberRepositoryError> for DomainError {
    fn from(error: MemberRepositoryError) -> Self {
        match error {
            MemberRepositoryError::Duplicate { ref field } => {
                DomainError::conflict(format!("A member with this {field} already exists"))
            }
            MemberRepositoryError::Connection { .. } | MemberRepositoryError::Query { .. } => {
                DomainError::internal("Member store unavailable").with_diagnostic(error.to_string())
            }
        }
    }
}

/// Local store for member records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Insert a member, returning the stored record.
    async fn insert(&self, member: &NewMember) -> Result<Member, MemberRepositoryError>;
}
