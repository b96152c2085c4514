//! Backend entry-point: loads settings, wires adapters and serves HTTP.

mod server;

use std::ffi::OsString;

use actix_web::web;
use color_eyre::eyre::{Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use orgadmin::config::{IdentitySettings, ServerSettings};
use orgadmin::inbound::http::health::HealthState;
use server::{build_http_state, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    // Settings come from files and the environment only.
    let args = [OsString::from("orgadmin")];
    let identity = IdentitySettings::load_from_iter(args.clone())
        .map_err(|error| eyre!("loading identity settings: {error}"))?;
    let server_settings = ServerSettings::load_from_iter(args)
        .map_err(|error| eyre!("loading server settings: {error}"))?;

    let http_state = build_http_state(&identity)?;
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), http_state, &server_settings)?;
    info!(bind_addr = %server_settings.bind_addr(), "server listening");

    let outcome = server.await;
    health_state.start_draining();
    outcome?;
    Ok(())
}
