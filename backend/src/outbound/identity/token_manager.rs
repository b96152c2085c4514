//! Service-account token cache for the identity service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;
use zeroize::Zeroizing;

use super::IdentityEndpoints;
use crate::domain::ports::{CredentialError, CredentialManager};
use crate::domain::{ExternalErrorBody, ExternalServiceFailure};

/// Longest token lifetime honoured, whatever the server claims.
const MAX_TOKEN_LIFETIME_SECS: i64 = 86_400;

/// Client-credentials grant parameters.
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Zeroizing<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    access_token: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>, skew: TimeDelta) -> bool {
        now + skew < self.expires_at
    }
}

/// Token-caching [`CredentialManager`] for the identity service.
pub struct IdentityTokenManager {
    client: Client,
    token_url: Url,
    credentials: ClientCredentials,
    clock: Arc<dyn Clock>,
    refresh_skew: TimeDelta,
    token: RwLock<Option<CachedToken>>,
}

impl IdentityTokenManager {
    /// Build a manager for the realm described by `endpoints`.
    ///
    /// Tokens are refreshed `refresh_skew` before they expire.
    pub fn new(
        client: Client,
        endpoints: &IdentityEndpoints,
        credentials: ClientCredentials,
        clock: Arc<dyn Clock>,
        refresh_skew: Duration,
    ) -> Self {
        Self {
            client,
            token_url: endpoints.token_url(),
            credentials,
            clock,
            refresh_skew: TimeDelta::from_std(refresh_skew).unwrap_or(TimeDelta::zero()),
            token: RwLock::new(None),
        }
    }

    /// Current access token, if one has been obtained.
    pub async fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .await
            .as_ref()
            .map(|token| token.access_token.as_str().to_owned())
    }

    #[cfg(test)]
    async fn seed(&self, access_token: &str, expires_at: DateTime<Utc>) {
        *self.token.write().await = Some(CachedToken {
            access_token: Zeroizing::new(access_token.to_owned()),
            expires_at,
        });
    }
}

fn rejection(status: u16, body: &[u8]) -> CredentialError {
    let failure = ExternalServiceFailure::from_response(status, body);
    let message = failure
        .body()
        .and_then(ExternalErrorBody::message)
        .or(failure.message())
        .unwrap_or("token request rejected")
        .to_owned();
    CredentialError::rejected(status, message)
}

#[async_trait]
impl CredentialManager for IdentityTokenManager {
    async fn ensure_authenticated(&self) -> Result<(), CredentialError> {
        let now = self.clock.utc();
        let fresh = self
            .token
            .read()
            .await
            .as_ref()
            .is_some_and(|token| token.is_fresh(now, self.refresh_skew));
        if fresh {
            return Ok(());
        }
        self.authenticate().await
    }

    async fn authenticate(&self) -> Result<(), CredentialError> {
        let response = self
            .client
            .post(self.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|error| CredentialError::transport(error.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| CredentialError::transport(error.to_string()))?;
        if !status.is_success() {
            return Err(rejection(status.as_u16(), body.as_ref()));
        }

        let token: TokenResponse = serde_json::from_slice(body.as_ref())
            .map_err(|error| CredentialError::malformed(error.to_string()))?;
        let lifetime = i64::try_from(token.expires_in)
            .map_or(MAX_TOKEN_LIFETIME_SECS, |secs| secs.min(MAX_TOKEN_LIFETIME_SECS));
        let expires_at = self.clock.utc() + TimeDelta::seconds(lifetime);
        *self.token.write().await = Some(CachedToken {
            access_token: Zeroizing::new(token.access_token),
            expires_at,
        });
        debug!(%expires_at, "identity service token refreshed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::{Local, TimeZone};
    use rstest::{fixture, rstest};

    struct FixtureClock(DateTime<Utc>);

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    #[fixture]
    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixtureClock(noon()))
    }

    fn manager(clock: Arc<dyn Clock>) -> IdentityTokenManager {
        // Port 9 (discard) refuses connections on loopback.
        let base = Url::parse("http://127.0.0.1:9/").expect("valid url");
        let endpoints = IdentityEndpoints::new(base, "master").expect("base url");
        IdentityTokenManager::new(
            Client::new(),
            &endpoints,
            ClientCredentials {
                client_id: "orgadmin".to_owned(),
                client_secret: Zeroizing::new("secret".to_owned()),
            },
            clock,
            Duration::from_secs(30),
        )
    }

    #[rstest]
    #[case(TimeDelta::seconds(31), true)]
    #[case(TimeDelta::seconds(30), false)]
    #[case(TimeDelta::seconds(-5), false)]
    fn freshness_honours_skew(#[case] remaining: TimeDelta, #[case] fresh: bool) {
        let token = CachedToken {
            access_token: Zeroizing::new("t".to_owned()),
            expires_at: noon() + remaining,
        };
        assert_eq!(token.is_fresh(noon(), TimeDelta::seconds(30)), fresh);
    }

    #[rstest]
    #[tokio::test]
    async fn fresh_token_skips_network(clock: Arc<dyn Clock>) {
        let manager = manager(clock);
        manager.seed("cached", noon() + TimeDelta::minutes(5)).await;

        manager
            .ensure_authenticated()
            .await
            .expect("cached token is reused");
        assert_eq!(manager.bearer().await.as_deref(), Some("cached"));
    }

    #[rstest]
    #[tokio::test]
    async fn stale_token_triggers_refresh(clock: Arc<dyn Clock>) {
        let manager = manager(clock);
        manager.seed("stale", noon() + TimeDelta::seconds(10)).await;

        let error = manager
            .ensure_authenticated()
            .await
            .expect_err("refresh reaches the unreachable endpoint");
        assert!(matches!(error, CredentialError::Transport { .. }));
        assert_eq!(manager.bearer().await.as_deref(), Some("stale"));
    }

    #[rstest]
    fn rejection_prefers_error_description() {
        let error = rejection(
            401,
            br#"{"error":"unauthorized_client","error_description":"Invalid client secret"}"#,
        );
        assert_eq!(error, CredentialError::rejected(401_u16, "Invalid client secret"));
    }

    #[rstest]
    fn rejection_falls_back_to_generic_message() {
        assert_eq!(
            rejection(503, b""),
            CredentialError::rejected(503_u16, "token request rejected")
        );
    }
}
