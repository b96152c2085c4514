//! Tests for identity service failure mapping.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ErrorKind;
use crate::domain::ports::{CapturingLog, LogLevel};

#[fixture]
fn log() -> Arc<CapturingLog> {
    Arc::new(CapturingLog::default())
}

fn mapper(log: &Arc<CapturingLog>) -> ExternalErrorMapper {
    ExternalErrorMapper::new("identity", log.clone())
}

fn body(value: serde_json::Value) -> ExternalErrorBody {
    serde_json::from_value(value).expect("fixture body decodes")
}

#[rstest]
#[case(400, ErrorKind::BadRequest)]
#[case(401, ErrorKind::Auth)]
#[case(403, ErrorKind::Forbidden)]
#[case(404, ErrorKind::NotFound)]
#[case(409, ErrorKind::Conflict)]
#[case(422, ErrorKind::Validation)]
#[case(500, ErrorKind::Internal)]
#[case(502, ErrorKind::Internal)]
#[case(503, ErrorKind::Internal)]
#[case(504, ErrorKind::Internal)]
#[case(418, ErrorKind::Internal)]
#[case(501, ErrorKind::Internal)]
fn status_maps_to_documented_kind(
    log: Arc<CapturingLog>,
    #[case] status: u16,
    #[case] kind: ErrorKind,
) {
    let failure = ExternalServiceFailure::with_response(status, body(json!({ "error": "x" })));
    assert_eq!(mapper(&log).map(failure).kind(), kind);
}

#[rstest]
fn missing_status_maps_to_internal(log: Arc<CapturingLog>) {
    let error = mapper(&log).map(ExternalServiceFailure::flat(None, "connection reset"));
    assert_eq!(error.kind(), ErrorKind::Internal);
    assert_eq!(error.message(), "connection reset");
}

#[rstest]
fn flat_status_code_is_used_without_response(log: Arc<CapturingLog>) {
    let error = mapper(&log).map(ExternalServiceFailure::flat(Some(404), "no such user"));
    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert_eq!(error.message(), "no such user");
}

#[rstest]
fn response_status_wins_over_flat_status_code(log: Arc<CapturingLog>) {
    let failure = ExternalServiceFailure {
        status_code: Some(500),
        ..ExternalServiceFailure::with_response(403, ExternalErrorBody::default())
    };
    assert_eq!(mapper(&log).map(failure).kind(), ErrorKind::Forbidden);
}

#[rstest]
#[case(json!({ "errorMessage": "A", "error_description": "B", "error": "C" }), "A")]
#[case(json!({ "error_description": "B", "error": "C" }), "B")]
#[case(json!({ "error": "C" }), "C")]
fn body_message_precedence(
    log: Arc<CapturingLog>,
    #[case] raw: serde_json::Value,
    #[case] expected: &str,
) {
    let failure = ExternalServiceFailure::with_response(409, body(raw)).with_message("fallback");
    assert_eq!(mapper(&log).map(failure).message(), expected);
}

#[rstest]
fn failure_message_used_when_body_is_silent(log: Arc<CapturingLog>) {
    let failure = ExternalServiceFailure::with_response(400, ExternalErrorBody::default())
        .with_message("request rejected");
    assert_eq!(mapper(&log).map(failure).message(), "request rejected");
}

#[rstest]
fn generic_message_names_the_service(log: Arc<CapturingLog>) {
    let failure = ExternalServiceFailure::with_response(404, ExternalErrorBody::default());
    assert_eq!(
        mapper(&log).map(failure).message(),
        "identity operation failed"
    );
}

#[rstest]
fn server_errors_are_prefixed(log: Arc<CapturingLog>) {
    let failure = ExternalServiceFailure::with_response(503, body(json!({ "error": "down" })));
    assert_eq!(
        mapper(&log).map(failure).message(),
        "identity service error: down"
    );
}

#[rstest]
fn unprocessable_entity_has_no_field_errors(log: Arc<CapturingLog>) {
    let failure = ExternalServiceFailure::with_response(
        422,
        body(json!({ "errorMessage": "invalid email" })),
    );
    let error = mapper(&log).map(failure);
    assert_eq!(error.kind(), ErrorKind::Validation);
    assert!(error.field_errors().is_empty());
    assert_eq!(error.message(), "invalid email");
}

#[rstest]
fn raw_failure_is_logged_before_mapping(log: Arc<CapturingLog>) {
    let failure = ExternalServiceFailure::with_response(
        409,
        body(json!({ "errorMessage": "User exists", "field": "username" })),
    )
    .with_stack("at create_user");

    mapper(&log).map(failure);

    let entries = log.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.level, LogLevel::Error);
    assert_eq!(entry.fields["status"], 409);
    assert_eq!(entry.fields["message"], "User exists");
    assert_eq!(entry.fields["body"]["field"], "username");
    assert_eq!(entry.fields["stack"], "at create_user");
}

#[rstest]
fn classify_matches_map_without_logging(log: Arc<CapturingLog>) {
    let failure = ExternalServiceFailure::with_response(
        403,
        body(json!({ "error_description": "Insufficient scope" })),
    );
    let mapper = mapper(&log);

    let classified = mapper.classify(&failure);

    assert!(log.entries().is_empty());
    assert_eq!(classified.kind(), ErrorKind::Forbidden);
    assert_eq!(classified, mapper.map(failure));
}

#[rstest]
fn diagnostic_records_raw_status(log: Arc<CapturingLog>) {
    let failure = ExternalServiceFailure::with_response(502, ExternalErrorBody::default());
    let error = mapper(&log).map(failure);
    assert!(error.diagnostic().is_some_and(|text| text.contains("502")));
}

#[rstest]
fn from_response_decodes_json_body() {
    let failure = ExternalServiceFailure::from_response(
        400,
        br#"{"error":"invalid_grant","error_description":"Stale token"}"#,
    );
    let decoded = failure.body().expect("body present");
    assert_eq!(decoded.message(), Some("Stale token"));
}

#[rstest]
fn from_response_keeps_plain_text_as_message() {
    let failure = ExternalServiceFailure::from_response(502, b"Bad Gateway\n");
    assert_eq!(failure.status(), Some(502));
    assert_eq!(failure.message(), Some("Bad Gateway"));
}

#[rstest]
fn from_response_with_empty_body_has_no_message() {
    let failure = ExternalServiceFailure::from_response(404, b"");
    assert!(failure.message().is_none());
}

#[rstest]
fn auth_failure_detection_uses_status() {
    assert!(ExternalServiceFailure::flat(Some(401), "expired").is_auth_failure());
    assert!(!ExternalServiceFailure::flat(Some(403), "denied").is_auth_failure());
    assert!(!ExternalServiceFailure::flat(None, "reset").is_auth_failure());
}

#[rstest]
fn credential_rejection_keeps_status() {
    let failure = ExternalServiceFailure::from(CredentialError::rejected(401_u16, "invalid client"));
    assert_eq!(failure.status(), Some(401));
    assert_eq!(failure.message(), Some("invalid client"));
}

#[rstest]
fn transport_failure_records_cause_chain() {
    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct Outer(#[source] std::io::Error);

    let outer = Outer(std::io::Error::other("connection refused"));
    let failure = ExternalServiceFailure::transport(&outer);
    assert_eq!(failure.status(), None);
    assert_eq!(failure.message(), Some("request failed"));
    assert!(failure.stack().is_some_and(|stack| stack.contains("connection refused")));
}
