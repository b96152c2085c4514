//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Ports describe how the coordination core expects to talk to its
//! collaborators: the credential manager of the identity service, the
//! identity directory itself, the local member store and the diagnostic
//! logger. Each trait exposes strongly typed errors so adapters map their
//! failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_manager;
mod diagnostic_log;
mod identity_directory;
mod member_repository;

#[cfg(test)]
pub use credential_manager::MockCredentialManager;
pub use credential_manager::{CredentialError, CredentialManager};
#[cfg(any(test, feature = "test-support"))]
pub use diagnostic_log::{CapturedEntry, CapturingLog, LogLevel};
pub use diagnostic_log::{DiagnosticLog, LogFields, log_fields};
#[cfg(test)]
pub use identity_directory::MockIdentityDirectory;
pub use identity_directory::{IdentityDirectory, IdentityUserId, NewIdentityUser};
#[cfg(test)]
pub use member_repository::MockMemberRepository;
pub use member_repository::{MemberRepository, MemberRepositoryError};
