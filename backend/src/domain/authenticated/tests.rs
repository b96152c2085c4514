//! Tests for the authenticated operation runner.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorKind;
use crate::domain::ports::{CapturingLog, CredentialError, LogLevel, MockCredentialManager};

#[fixture]
fn log() -> Arc<CapturingLog> {
    Arc::new(CapturingLog::default())
}

fn runner(log: &Arc<CapturingLog>) -> AuthenticatedOperationRunner {
    AuthenticatedOperationRunner::new(ExternalErrorMapper::new("identity", log.clone()), log.clone())
}

fn credentials(authenticate_calls: usize) -> MockCredentialManager {
    let mut credentials = MockCredentialManager::new();
    credentials
        .expect_ensure_authenticated()
        .times(1)
        .returning(|| Ok(()));
    credentials
        .expect_authenticate()
        .times(authenticate_calls)
        .returning(|| Ok(()));
    credentials
}

fn expired() -> ExternalServiceFailure {
    ExternalServiceFailure::flat(Some(401), "token expired")
}

#[rstest]
#[tokio::test]
async fn success_runs_operation_once(log: Arc<CapturingLog>) {
    let calls = &AtomicUsize::new(0);
    let credentials = credentials(0);

    let value = runner(&log)
        .run(
            &credentials,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ExternalServiceFailure>(7)
            },
            "list users",
        )
        .await
        .expect("operation succeeds");

    assert_eq!(value, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(log.entries().is_empty());
}

#[rstest]
#[tokio::test]
async fn retries_once_after_auth_failure(log: Arc<CapturingLog>) {
    let calls = &AtomicUsize::new(0);
    let credentials = credentials(1);

    let value = runner(&log)
        .run(
            &credentials,
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(expired())
                } else {
                    Ok("created")
                }
            },
            "create user",
        )
        .await
        .expect("retry succeeds");

    assert_eq!(value, "created");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let warnings = log.at(LogLevel::Warn);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].fields["operation"], "create user");
}

#[rstest]
#[tokio::test]
async fn persistent_auth_failure_surfaces_auth_error(log: Arc<CapturingLog>) {
    let calls = &AtomicUsize::new(0);
    let credentials = credentials(1);

    let error = runner(&log)
        .run(
            &credentials,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(expired())
            },
            "delete user",
        )
        .await
        .expect_err("second attempt fails");

    assert_eq!(error.kind(), ErrorKind::Auth);
    assert_eq!(error.message(), "token expired");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let errors = log.at(LogLevel::Error);
    assert!(
        errors
            .iter()
            .any(|entry| entry.message == "delete user failed after retry"
                && entry.fields["message"] == "token expired")
    );
}

#[rstest]
#[case(403, ErrorKind::Forbidden)]
#[case(404, ErrorKind::NotFound)]
#[case(500, ErrorKind::Internal)]
#[tokio::test]
async fn non_auth_failures_are_never_retried(
    log: Arc<CapturingLog>,
    #[case] status: u16,
    #[case] kind: ErrorKind,
) {
    let calls = &AtomicUsize::new(0);
    let credentials = credentials(0);

    let error = runner(&log)
        .run(
            &credentials,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ExternalServiceFailure::flat(Some(status), "nope"))
            },
            "update user",
        )
        .await
        .expect_err("operation fails");

    assert_eq!(error.kind(), kind);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(log.at(LogLevel::Warn).is_empty());
}

#[rstest]
#[tokio::test]
async fn retry_with_different_failure_maps_that_failure(log: Arc<CapturingLog>) {
    let calls = &AtomicUsize::new(0);
    let credentials = credentials(1);

    let error = runner(&log)
        .run(
            &credentials,
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err::<(), _>(expired())
                } else {
                    Err(ExternalServiceFailure::flat(Some(409), "User exists"))
                }
            },
            "create user",
        )
        .await
        .expect_err("retry fails");

    assert_eq!(error.kind(), ErrorKind::Conflict);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[rstest]
#[tokio::test]
async fn ensure_failure_skips_operation(log: Arc<CapturingLog>) {
    let calls = &AtomicUsize::new(0);
    let mut credentials = MockCredentialManager::new();
    credentials
        .expect_ensure_authenticated()
        .times(1)
        .returning(|| Err(CredentialError::transport("connection refused")));
    credentials.expect_authenticate().times(0);

    let error = runner(&log)
        .run(
            &credentials,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ExternalServiceFailure>(())
            },
            "list users",
        )
        .await
        .expect_err("credential failure surfaces");

    assert_eq!(error.kind(), ErrorKind::Internal);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn failed_reauthentication_stops_before_retry(log: Arc<CapturingLog>) {
    let calls = &AtomicUsize::new(0);
    let mut credentials = MockCredentialManager::new();
    credentials
        .expect_ensure_authenticated()
        .times(1)
        .returning(|| Ok(()));
    credentials
        .expect_authenticate()
        .times(1)
        .returning(|| Err(CredentialError::rejected(401_u16, "invalid client credentials")));

    let error = runner(&log)
        .run(
            &credentials,
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(expired())
            },
            "create user",
        )
        .await
        .expect_err("re-authentication fails");

    assert_eq!(error.kind(), ErrorKind::Auth);
    assert_eq!(error.message(), "invalid client credentials");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
