//! Tests for the member enrolment endpoint.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{CapturingLog, IdentityUserId, MockIdentityDirectory};
use crate::domain::{DualStoreCoordinator, ExternalErrorMapper, MemberEnrolment};
use crate::inbound::http::error_handler::ErrorHandler;
use crate::outbound::memory::InMemoryMemberRepository;

#[fixture]
fn log() -> Arc<CapturingLog> {
    Arc::new(CapturingLog::default())
}

fn state(directory: MockIdentityDirectory, log: &Arc<CapturingLog>) -> web::Data<HttpState> {
    let enrolment = MemberEnrolment::new(
        Arc::new(directory),
        Arc::new(InMemoryMemberRepository::new(Arc::new(DefaultClock))),
        DualStoreCoordinator::new(log.clone()),
    );
    let errors = ErrorHandler::new(ExternalErrorMapper::new("identity", log.clone()), log.clone());
    web::Data::new(HttpState::new(Arc::new(enrolment), Arc::new(errors)))
}

async fn post_members(state: web::Data<HttpState>, body: &'static str) -> (StatusCode, Value) {
    let app = test::init_service(
        App::new()
            .app_data(state)
            .app_data(json_config())
            .service(web::scope("/api/v1").service(enrol_member)),
    )
    .await;
    let request = test::TestRequest::post()
        .uri("/api/v1/members")
        .insert_header(("content-type", "application/json"))
        .set_payload(body)
        .to_request();
    let response = test::call_service(&app, request).await;
    let status = response.status();
    let value: Value = test::read_body_json(response).await;
    (status, value)
}

#[rstest]
#[actix_web::test]
async fn enrols_member(log: Arc<CapturingLog>) {
    let mut directory = MockIdentityDirectory::new();
    directory
        .expect_create_user()
        .times(1)
        .returning(|_| Ok(IdentityUserId::new("kc-1")));

    let (status, body) = post_members(
        state(directory, &log),
        r#"{"name":"Ada Lovelace","email":"ada@example.org","username":"ada.l"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["identityId"], "kc-1");
    assert_eq!(body["username"], "ada.l");
    assert!(log.entries().is_empty());
}

#[rstest]
#[actix_web::test]
async fn invalid_fields_yield_validation_envelope(log: Arc<CapturingLog>) {
    let mut directory = MockIdentityDirectory::new();
    directory.expect_create_user().times(0);

    let (status, body) = post_members(
        state(directory, &log),
        r#"{"name":"","email":"bad","username":"ab"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Validation failed");
    let details = body["error"]["details"].as_array().expect("details array");
    assert_eq!(details.len(), 3);
    assert_eq!(details[1], json!({ "field": "email", "message": "Invalid email format", "value": "bad" }));
}

#[rstest]
#[actix_web::test]
async fn malformed_json_is_a_bad_request(log: Arc<CapturingLog>) {
    let (status, body) = post_members(state(MockIdentityDirectory::new(), &log), "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(log.entries().len(), 1);
}

#[rstest]
#[actix_web::test]
async fn identity_conflict_is_reported(log: Arc<CapturingLog>) {
    let mut directory = MockIdentityDirectory::new();
    directory
        .expect_create_user()
        .times(1)
        .returning(|_| Err(DomainError::conflict("User exists with same username")));

    let (status, body) = post_members(
        state(directory, &log),
        r#"{"name":"Ada Lovelace","email":"ada@example.org","username":"ada.l"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({ "error": { "code": "CONFLICT", "message": "User exists with same username" } })
    );
}

#[rstest]
#[actix_web::test]
async fn duplicate_local_member_rolls_back_identity_user(log: Arc<CapturingLog>) {
    let mut directory = MockIdentityDirectory::new();
    let mut next = 0_u32;
    directory.expect_create_user().times(2).returning(move |_| {
        next += 1;
        Ok(IdentityUserId::new(format!("kc-{next}")))
    });
    directory
        .expect_delete_user()
        .withf(|id| id.as_str() == "kc-2")
        .times(1)
        .returning(|_| Ok(()));

    let state = state(directory, &log);
    let app = test::init_service(
        App::new()
            .app_data(state)
            .app_data(json_config())
            .service(web::scope("/api/v1").service(enrol_member)),
    )
    .await;
    let mut statuses = Vec::new();
    for username in ["ada.l", "ada.two"] {
        let request = test::TestRequest::post()
            .uri("/api/v1/members")
            .set_json(json!({ "name": "Ada", "email": "ada@example.org", "username": username }))
            .to_request();
        statuses.push(test::call_service(&app, request).await.status());
    }

    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
}
