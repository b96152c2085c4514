//! Builds the HTTP state from settings.

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultClock;
use reqwest::Client;

use orgadmin::config::IdentitySettings;
use orgadmin::domain::ports::DiagnosticLog;
use orgadmin::domain::{
    AuthenticatedOperationRunner, DualStoreCoordinator, ExternalErrorMapper, MemberEnrolment,
};
use orgadmin::inbound::http::ErrorHandler;
use orgadmin::inbound::http::state::HttpState;
use orgadmin::outbound::identity::{
    ClientCredentials, HttpIdentityDirectory, IdentityEndpoints, IdentityTokenManager,
};
use orgadmin::outbound::logging::TracingDiagnosticLog;
use orgadmin::outbound::memory::InMemoryMemberRepository;

/// Wire the identity adapters, the member store and the error handler.
///
/// # Errors
/// Fails when identity settings are missing or invalid, or the HTTP client
/// cannot be built.
pub fn build_http_state(identity: &IdentitySettings) -> Result<web::Data<HttpState>> {
    let log: Arc<dyn DiagnosticLog> = Arc::new(TracingDiagnosticLog);
    let mapper = ExternalErrorMapper::new(identity.service_name(), log.clone());

    let client = Client::builder()
        .timeout(identity.request_timeout())
        .build()
        .wrap_err("building identity HTTP client")?;
    let endpoints = IdentityEndpoints::new(identity.base_url()?, identity.realm())?;
    let tokens = Arc::new(IdentityTokenManager::new(
        client.clone(),
        &endpoints,
        ClientCredentials {
            client_id: identity.client_id()?.to_owned(),
            client_secret: identity.client_secret()?,
        },
        Arc::new(DefaultClock),
        identity.token_refresh_skew(),
    ));
    let directory = HttpIdentityDirectory::new(
        client,
        endpoints,
        tokens,
        AuthenticatedOperationRunner::new(mapper.clone(), log.clone()),
    );

    let enrolment = MemberEnrolment::new(
        Arc::new(directory),
        Arc::new(InMemoryMemberRepository::new(Arc::new(DefaultClock))),
        DualStoreCoordinator::new(log.clone()),
    );
    let errors = ErrorHandler::new(mapper, log);

    Ok(web::Data::new(HttpState::new(
        Arc::new(enrolment),
        Arc::new(errors),
    )))
}
