//! Port for the identity service's credential manager.
//!
//! The manager owns the service account token used by every outbound
//! identity call. The authenticated operation runner drives it: it asks for a
//! valid credential before each operation and forces a refresh at most once
//! when the operation reports an expired credential.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised while obtaining or refreshing a credential.
    pub enum CredentialError {
        /// The identity service answered the token request with an error status.
        Rejected { status: u16, message: String } =>
            "credential request rejected with status {status}: {message}",
        /// The token endpoint could not be reached.
        Transport { message: String } => "credential request failed: {message}",
        /// The token endpoint replied with a payload we could not decode.
        Malformed { message: String } => "credential response malformed: {message}",
    }
}

impl CredentialError {
    /// HTTP status reported by the token endpoint, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Malformed { .. } => None,
        }
    }
}

/// Credential lifecycle for the identity service.
///
/// Implementations must be safe for concurrent use; the runner holds no lock
/// around these calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialManager: Send + Sync {
    /// Make sure a usable credential is cached.
    ///
    /// Cheap when the cached credential is still valid.
    async fn ensure_authenticated(&self) -> Result<(), CredentialError>;

    /// Unconditionally obtain a fresh credential, replacing the cached one.
    async fn authenticate(&self) -> Result<(), CredentialError>;
}
