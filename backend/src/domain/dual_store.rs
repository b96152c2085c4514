//! Best-effort two-step writes across the identity store and the local store.
//!
//! The external write always completes before the local write starts. When
//! the local write fails after the external write committed, one compensating
//! action undoes the external write. The caller always receives the original
//! local failure; a failed compensation is logged and swallowed.
//!
//! This is not atomic. Nothing is persisted before the external write, so a
//! crash between the two steps leaves the identity record without a local
//! counterpart and no record to recover from. The same holds when the
//! external write commits but reports failure, such as a created identity
//! user without a location: the coordinator never sees an output to
//! compensate, so the adapter logs the orphan instead.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use serde_json::json;

use super::ports::{DiagnosticLog, log_fields};

/// Progress of the local write within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalStep {
    /// The local write never started.
    #[default]
    NotAttempted,
    /// The local write succeeded.
    Committed,
    /// The local write failed.
    Failed,
}

/// Result of the compensating action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackOutcome {
    Succeeded,
    Failed,
}

/// Transient record of one coordinator run. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SagaOutcome {
    /// The external write succeeded.
    pub external_committed: bool,
    /// What happened to the local write.
    pub local: LocalStep,
    /// The compensating action was invoked.
    pub rollback_attempted: bool,
    /// How the compensating action ended, if invoked.
    pub rollback_outcome: Option<RollbackOutcome>,
}

/// Sequences an external write, a local write, and at most one compensation.
#[derive(Clone)]
pub struct DualStoreCoordinator {
    log: Arc<dyn DiagnosticLog>,
}

impl DualStoreCoordinator {
    /// Build a coordinator logging through `log`.
    pub fn new(log: Arc<dyn DiagnosticLog>) -> Self {
        Self { log }
    }

    /// Run the two-step write and return the local result.
    ///
    /// `local_write` receives a copy of the external write's output and
    /// `compensate` receives the output itself, so the compensation can
    /// target exactly what was created.
    ///
    /// # Errors
    ///
    /// Returns the external failure unchanged when the external write fails,
    /// otherwise the original local failure when the local write fails.
    pub async fn run<X, T, E, C, FE, FEFut, FL, FLFut, FC, FCFut>(
        &self,
        external_write: FE,
        local_write: FL,
        compensate: FC,
        operation_name: &str,
    ) -> Result<T, E>
    where
        X: Clone,
        E: Display,
        C: Display,
        FE: FnOnce() -> FEFut,
        FEFut: Future<Output = Result<X, E>>,
        FL: FnOnce(X) -> FLFut,
        FLFut: Future<Output = Result<T, E>>,
        FC: FnOnce(X) -> FCFut,
        FCFut: Future<Output = Result<(), C>>,
    {
        self.run_with_outcome(external_write, local_write, compensate, operation_name)
            .await
            .0
    }

    /// Like [`Self::run`], also returning the [`SagaOutcome`] of the run.
    pub async fn run_with_outcome<X, T, E, C, FE, FEFut, FL, FLFut, FC, FCFut>(
        &self,
        external_write: FE,
        local_write: FL,
        compensate: FC,
        operation_name: &str,
    ) -> (Result<T, E>, SagaOutcome)
    where
        X: Clone,
        E: Display,
        C: Display,
        FE: FnOnce() -> FEFut,
        FEFut: Future<Output = Result<X, E>>,
        FL: FnOnce(X) -> FLFut,
        FLFut: Future<Output = Result<T, E>>,
        FC: FnOnce(X) -> FCFut,
        FCFut: Future<Output = Result<(), C>>,
    {
        let mut outcome = SagaOutcome::default();

        let external = match external_write().await {
            Ok(external) => external,
            Err(error) => return (Err(error), outcome),
        };
        outcome.external_committed = true;

        let local_error = match local_write(external.clone()).await {
            Ok(value) => {
                outcome.local = LocalStep::Committed;
                return (Ok(value), outcome);
            }
            Err(error) => error,
        };
        outcome.local = LocalStep::Failed;

        self.log.error(
            &format!("{operation_name}: local write failed, compensating external write"),
            log_fields(json!({
                "operation": operation_name,
                "error": local_error.to_string(),
            })),
        );

        outcome.rollback_attempted = true;
        match compensate(external).await {
            Ok(()) => {
                outcome.rollback_outcome = Some(RollbackOutcome::Succeeded);
                self.log.info(
                    &format!("{operation_name}: external write rolled back"),
                    log_fields(json!({ "operation": operation_name })),
                );
            }
            Err(compensation_error) => {
                outcome.rollback_outcome = Some(RollbackOutcome::Failed);
                self.log.error(
                    &format!("{operation_name}: compensation failed, stores are inconsistent"),
                    log_fields(json!({
                        "operation": operation_name,
                        "compensationError": compensation_error.to_string(),
                        "originalError": local_error.to_string(),
                    })),
                );
            }
        }

        (Err(local_error), outcome)
    }
}
