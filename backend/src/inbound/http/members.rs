//! Member enrolment endpoint.
//!
//! ```text
//! POST /api/v1/members {"name":"Ada Lovelace","email":"ada@example.org","username":"ada.l"}
//! ```

use actix_web::error::JsonPayloadError;
use actix_web::{HttpRequest, HttpResponse, post, web};

use super::error::{ApiResult, ErrorEnvelope};
use super::error_handler::Failure;
use super::request_context::RequestContext;
use super::state::HttpState;
use crate::domain::{DomainError, EnrolMemberRequest, Member};

/// JSON extractor settings routing body errors through the error handler.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(reject_payload)
}

fn reject_payload(error: JsonPayloadError, request: &HttpRequest) -> actix_web::Error {
    let Some(state) = request.app_data::<web::Data<HttpState>>() else {
        return actix_web::error::ErrorBadRequest(error);
    };
    let failure = Failure::Domain(DomainError::bad_request(format!(
        "Malformed request body: {error}"
    )));
    state.errors.handle(failure, &RequestContext::of(request)).into()
}

/// Enrol a member in the identity store and the local store.
#[utoipa::path(
    post,
    path = "/api/v1/members",
    request_body = EnrolMemberRequest,
    responses(
        (status = 201, description = "Member enrolled", body = Member),
        (status = 400, description = "Invalid request", body = ErrorEnvelope),
        (status = 401, description = "Identity service rejected our credentials", body = ErrorEnvelope),
        (status = 409, description = "Member already exists", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope)
    ),
    tags = ["members"],
    operation_id = "enrolMember"
)]
#[post("/members")]
pub async fn enrol_member(
    state: web::Data<HttpState>,
    context: RequestContext,
    payload: web::Json<EnrolMemberRequest>,
) -> ApiResult<HttpResponse> {
    let member = state
        .enrolment
        .enrol(payload.into_inner())
        .await
        .map_err(|error| state.errors.handle(error.into(), &context))?;
    Ok(HttpResponse::Created().json(member))
}

#[cfg(test)]
mod tests;
