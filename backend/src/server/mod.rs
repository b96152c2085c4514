//! Server construction and dependency wiring.

mod state_builders;

pub use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use orgadmin::config::ServerSettings;
use orgadmin::doc::openapi_json;
use orgadmin::inbound::http::health::{HealthState, live, ready};
use orgadmin::inbound::http::members::{enrol_member, json_config};
use orgadmin::inbound::http::state::HttpState;

fn build_app(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let api = web::scope("/api/v1").service(enrol_member);

    App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config())
        .service(api)
        .service(ready)
        .service(live)
        .service(openapi_json)
}

/// Bind the HTTP server and mark the service ready.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    settings: &ServerSettings,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || build_app(server_health_state.clone(), http_state.clone()))
        .bind(settings.bind_addr())?
        .run();

    health_state.start_serving();
    Ok(server)
}
