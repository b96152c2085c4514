//! Consistency coordination core.
//!
//! Purpose: classify failures into a typed taxonomy, retry identity service
//! calls once after re-authentication, and coordinate two-step writes across
//! the identity store and the local store. Everything here is transport
//! agnostic; inbound adapters render [`DomainError`] into HTTP responses.
//!
//! Public surface:
//! - DomainError / ErrorKind / FieldError — the error taxonomy.
//! - validation — field validation collector and standard validators.
//! - ExternalServiceFailure / ExternalErrorMapper — identity service failures.
//! - AuthenticatedOperationRunner — single re-authentication retry.
//! - DualStoreCoordinator — best-effort saga with one compensation.
//! - MemberEnrolment — enrolment service built on the above.

pub mod authenticated;
pub mod correlation;
pub mod dual_store;
pub mod error;
pub mod external_error;
pub mod members;
pub mod ports;
pub mod validation;

pub use self::authenticated::AuthenticatedOperationRunner;
pub use self::correlation::CorrelationId;
pub use self::dual_store::{DualStoreCoordinator, LocalStep, RollbackOutcome, SagaOutcome};
pub use self::error::{DomainError, ErrorKind, FieldError};
pub use self::external_error::{
    ExternalErrorBody, ExternalErrorMapper, ExternalResponse, ExternalServiceFailure,
};
pub use self::members::{EnrolMemberRequest, Member, MemberEnrolment, NewMember};
