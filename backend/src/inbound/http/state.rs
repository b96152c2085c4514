//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` so they only depend on
//! domain services and the error handler.

use std::sync::Arc;

use super::error_handler::ErrorHandler;
use crate::domain::MemberEnrolment;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub enrolment: Arc<MemberEnrolment>,
    pub errors: Arc<ErrorHandler>,
}

impl HttpState {
    /// Bundle the enrolment service with the error handler.
    pub fn new(enrolment: Arc<MemberEnrolment>, errors: Arc<ErrorHandler>) -> Self {
        Self { enrolment, errors }
    }
}
