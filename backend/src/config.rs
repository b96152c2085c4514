//! Runtime settings loaded via OrthoConfig.
//!
//! Values come from configuration files and `IDENTITY_*` / `SERVER_*`
//! environment variables. Optional fields fall back to the defaults below;
//! the identity service location and client credentials are required.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

const DEFAULT_REALM: &str = "master";
const DEFAULT_SERVICE_NAME: &str = "identity";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TOKEN_REFRESH_SKEW_SECS: u64 = 30;
const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8080));

/// Problems with loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A required setting is absent or blank.
    #[error("missing required setting {key}")]
    Missing { key: &'static str },
    /// The identity base URL does not parse.
    #[error("invalid {key} {value:?}: {message}")]
    InvalidUrl {
        key: &'static str,
        value: String,
        message: String,
    },
}

/// Connection settings for the external identity service.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "IDENTITY")]
pub struct IdentitySettings {
    /// Root URL of the identity service, e.g. `https://id.example.org/`.
    pub base_url: Option<String>,
    /// Realm holding the members.
    pub realm: Option<String>,
    /// Service-account client id.
    pub client_id: Option<String>,
    /// Service-account client secret.
    pub client_secret: Option<String>,
    /// Name used in log entries and fallback error messages.
    pub service_name: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Refresh tokens this many seconds before they expire.
    pub token_refresh_skew_secs: Option<u64>,
}

fn required<'a>(value: Option<&'a str>, key: &'static str) -> Result<&'a str, SettingsError> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(SettingsError::Missing { key })
}

impl IdentitySettings {
    /// Parsed base URL.
    ///
    /// # Errors
    ///
    /// [`SettingsError::Missing`] when unset, [`SettingsError::InvalidUrl`]
    /// when it does not parse.
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = required(self.base_url.as_deref(), "identity.base_url")?;
        Url::parse(raw).map_err(|error| SettingsError::InvalidUrl {
            key: "identity.base_url",
            value: raw.to_owned(),
            message: error.to_string(),
        })
    }

    pub fn realm(&self) -> &str {
        self.realm.as_deref().unwrap_or(DEFAULT_REALM)
    }

    /// # Errors
    ///
    /// [`SettingsError::Missing`] when unset.
    pub fn client_id(&self) -> Result<&str, SettingsError> {
        required(self.client_id.as_deref(), "identity.client_id")
    }

    /// # Errors
    ///
    /// [`SettingsError::Missing`] when unset.
    pub fn client_secret(&self) -> Result<Zeroizing<String>, SettingsError> {
        required(self.client_secret.as_deref(), "identity.client_secret")
            .map(|secret| Zeroizing::new(secret.to_owned()))
    }

    pub fn service_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn token_refresh_skew(&self) -> Duration {
        Duration::from_secs(
            self.token_refresh_skew_secs
                .unwrap_or(DEFAULT_TOKEN_REFRESH_SKEW_SECS),
        )
    }
}

impl fmt::Debug for IdentitySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentitySettings")
            .field("base_url", &self.base_url)
            .field("realm", &self.realm)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("service_name", &self.service_name)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("token_refresh_skew_secs", &self.token_refresh_skew_secs)
            .finish()
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SERVER")]
pub struct ServerSettings {
    /// Socket address to bind, e.g. `0.0.0.0:8080`.
    pub bind_addr: Option<SocketAddr>,
}

impl ServerSettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }
}
