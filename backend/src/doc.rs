//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the member enrolment endpoint, the health probes and
//! the error envelope every failing request returns. The document is served
//! at `/api-docs/openapi.json` and printed by the `openapi-dump` binary.

use actix_web::{HttpResponse, get};
use utoipa::OpenApi;

use crate::domain::{EnrolMemberRequest, FieldError, Member};
use crate::inbound::http::health::{Phase, ProbeReport};
use crate::inbound::http::{ErrorBody, ErrorEnvelope};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Organisation admin API",
        description = "Member administration backed by an external identity service."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::members::enrol_member,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorEnvelope,
        ErrorBody,
        FieldError,
        Member,
        EnrolMemberRequest,
        ProbeReport,
        Phase
    )),
    tags(
        (name = "members", description = "Member enrolment"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document as JSON.
#[get("/api-docs/openapi.json")]
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
