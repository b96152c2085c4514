//! Authenticated identity service calls with a single re-authentication retry.
//!
//! Every call runs through a small state machine:
//!
//! - `Start`: ensure a credential is cached, then invoke the operation.
//! - On a 401 failure in `Start`: force one re-authentication and move to
//!   `Retry`, invoking the operation once more.
//! - Any other outcome is terminal: success returns the value, failure is
//!   mapped through [`ExternalErrorMapper`].
//!
//! The operation therefore runs at most twice and `authenticate` at most once
//! per call.

use std::future::Future;
use std::sync::Arc;

use serde_json::json;

use super::ports::{CredentialManager, DiagnosticLog, log_fields};
use super::{DomainError, ExternalErrorMapper, ExternalServiceFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Retry,
}

/// Runs identity service operations behind a valid credential.
#[derive(Clone)]
pub struct AuthenticatedOperationRunner {
    mapper: ExternalErrorMapper,
    log: Arc<dyn DiagnosticLog>,
}

impl AuthenticatedOperationRunner {
    /// Build a runner mapping failures through `mapper`.
    pub fn new(mapper: ExternalErrorMapper, log: Arc<dyn DiagnosticLog>) -> Self {
        Self { mapper, log }
    }

    /// Mapper used for terminal failures.
    pub fn mapper(&self) -> &ExternalErrorMapper {
        &self.mapper
    }

    /// Log shared with the adapters the runner drives.
    pub fn log(&self) -> &dyn DiagnosticLog {
        self.log.as_ref()
    }

    /// Run `operation` with a valid credential, retrying once after a forced
    /// re-authentication if it fails with status 401.
    ///
    /// Failures of the credential manager itself are mapped like operation
    /// failures and are never retried.
    ///
    /// # Errors
    ///
    /// Returns the mapped [`DomainError`] of the terminal failure.
    pub async fn run<C, F, Fut, T>(
        &self,
        credentials: &C,
        mut operation: F,
        operation_name: &str,
    ) -> Result<T, DomainError>
    where
        C: CredentialManager + ?Sized,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExternalServiceFailure>>,
    {
        if let Err(error) = credentials.ensure_authenticated().await {
            return Err(self.mapper.map(error.into()));
        }

        let mut phase = Phase::Start;
        loop {
            let failure = match operation().await {
                Ok(value) => return Ok(value),
                Err(failure) => failure,
            };

            match phase {
                Phase::Start if failure.is_auth_failure() => {
                    self.log.warn(
                        &format!("{operation_name}: credential rejected, re-authenticating"),
                        log_fields(json!({
                            "operation": operation_name,
                            "status": failure.status(),
                        })),
                    );
                    if let Err(error) = credentials.authenticate().await {
                        return Err(self.mapper.map(error.into()));
                    }
                    phase = Phase::Retry;
                }
                Phase::Start => return Err(self.mapper.map(failure)),
                Phase::Retry => {
                    let message = self.mapper.message_for(&failure);
                    self.log.error(
                        &format!("{operation_name} failed after retry"),
                        log_fields(json!({
                            "operation": operation_name,
                            "status": failure.status(),
                            "message": message,
                        })),
                    );
                    return Err(self.mapper.map(failure));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
