//! Adapters for the external identity service (Keycloak-compatible admin
//! API).
//!
//! - [`IdentityTokenManager`] caches a service-account token obtained with
//!   the OAuth2 client-credentials grant.
//! - [`HttpIdentityDirectory`] creates and deletes users, running each call
//!   through the authenticated operation runner.

mod directory;
mod token_manager;

use thiserror::Error;
use url::Url;

use crate::domain::ports::IdentityUserId;

pub use directory::HttpIdentityDirectory;
pub use token_manager::{ClientCredentials, IdentityTokenManager};

/// Errors raised when deriving identity service URLs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityEndpointError {
    /// The base URL cannot carry path segments (e.g. `mailto:`).
    #[error("identity base url {url} cannot carry a path")]
    NotABase { url: String },
}

/// URL layout of one realm on the identity service.
///
/// # Examples
/// ```
/// use orgadmin::outbound::identity::IdentityEndpoints;
/// use url::Url;
///
/// let base = Url::parse("https://id.example.org/auth/").expect("valid url");
/// let endpoints = IdentityEndpoints::new(base, "members").expect("base url");
/// assert_eq!(
///     endpoints.token_url().as_str(),
///     "https://id.example.org/auth/realms/members/protocol/openid-connect/token"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEndpoints {
    base: Url,
    realm: String,
}

impl IdentityEndpoints {
    /// Describe `realm` hosted under `base`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityEndpointError::NotABase`] when `base` cannot carry a
    /// path.
    pub fn new(base: Url, realm: impl Into<String>) -> Result<Self, IdentityEndpointError> {
        if base.cannot_be_a_base() {
            return Err(IdentityEndpointError::NotABase {
                url: base.to_string(),
            });
        }
        Ok(Self {
            base,
            realm: realm.into(),
        })
    }

    /// Realm name.
    pub fn realm(&self) -> &str {
        self.realm.as_str()
    }

    fn with_segments(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// OAuth2 token endpoint of the realm.
    pub fn token_url(&self) -> Url {
        self.with_segments(&[
            "realms",
            &self.realm,
            "protocol",
            "openid-connect",
            "token",
        ])
    }

    /// Admin collection of the realm's users.
    pub fn users_url(&self) -> Url {
        self.with_segments(&["admin", "realms", &self.realm, "users"])
    }

    /// Admin resource of one user.
    pub fn user_url(&self, id: &IdentityUserId) -> Url {
        self.with_segments(&["admin", "realms", &self.realm, "users", id.as_str()])
    }
}
