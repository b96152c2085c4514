//! User directory backed by the identity service's admin REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::json;

use super::{IdentityEndpoints, IdentityTokenManager};
use crate::domain::ports::{IdentityDirectory, IdentityUserId, NewIdentityUser, log_fields};
use crate::domain::{AuthenticatedOperationRunner, DomainError, ExternalServiceFailure};

const CREATE_USER: &str = "create identity user";
const DELETE_USER: &str = "delete identity user";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRepresentation<'a> {
    username: &'a str,
    email: &'a str,
    first_name: &'a str,
    enabled: bool,
    email_verified: bool,
}

impl<'a> From<&'a NewIdentityUser> for UserRepresentation<'a> {
    fn from(user: &'a NewIdentityUser) -> Self {
        Self {
            username: &user.username,
            email: &user.email,
            first_name: &user.display_name,
            enabled: true,
            email_verified: false,
        }
    }
}

/// [`IdentityDirectory`] speaking to the identity service over HTTP.
pub struct HttpIdentityDirectory {
    client: Client,
    endpoints: IdentityEndpoints,
    tokens: Arc<IdentityTokenManager>,
    runner: AuthenticatedOperationRunner,
}

impl HttpIdentityDirectory {
    /// Build a directory calling `endpoints` with tokens from `tokens`.
    ///
    /// Every call runs through `runner`, which also supplies the log.
    pub fn new(
        client: Client,
        endpoints: IdentityEndpoints,
        tokens: Arc<IdentityTokenManager>,
        runner: AuthenticatedOperationRunner,
    ) -> Self {
        Self {
            client,
            endpoints,
            tokens,
            runner,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ExternalServiceFailure> {
        // A missing token is reported as 401 so the runner re-authenticates.
        let Some(token) = self.tokens.bearer().await else {
            return Err(ExternalServiceFailure::flat(
                Some(401),
                "no access token available",
            ));
        };
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| ExternalServiceFailure::transport(&error))?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|error| ExternalServiceFailure::transport(&error))?;
        Err(ExternalServiceFailure::from_response(status, body.as_ref()))
    }

    async fn post_user(&self, user: &NewIdentityUser) -> Result<IdentityUserId, ExternalServiceFailure> {
        let request = self
            .client
            .post(self.endpoints.users_url())
            .json(&UserRepresentation::from(user));
        let response = self.send(request).await?;
        let Some(id) = user_id_from_location(&response) else {
            // The user exists remotely but cannot be addressed, so nothing
            // will compensate for it.
            let status = response.status().as_u16();
            self.runner.log().error(
                &format!("{CREATE_USER}: created without a location, identity user is orphaned"),
                log_fields(json!({
                    "operation": CREATE_USER,
                    "username": user.username,
                    "status": status,
                })),
            );
            return Err(ExternalServiceFailure::flat(
                Some(status),
                "identity service did not return the new user's location",
            ));
        };
        Ok(id)
    }

    async fn remove_user(&self, id: &IdentityUserId) -> Result<(), ExternalServiceFailure> {
        let request = self.client.delete(self.endpoints.user_url(id));
        self.send(request).await.map(drop)
    }
}

fn user_id_from_location(response: &Response) -> Option<IdentityUserId> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    last_path_segment(location).map(IdentityUserId::new)
}

fn last_path_segment(location: &str) -> Option<&str> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
}

#[async_trait]
impl IdentityDirectory for HttpIdentityDirectory {
    async fn create_user(&self, user: &NewIdentityUser) -> Result<IdentityUserId, DomainError> {
        self.runner
            .run(self.tokens.as_ref(), move || self.post_user(user), CREATE_USER)
            .await
    }

    async fn delete_user(&self, id: &IdentityUserId) -> Result<(), DomainError> {
        self.runner
            .run(self.tokens.as_ref(), move || self.remove_user(id), DELETE_USER)
            .await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://id.example.org/admin/realms/master/users/4f1c", Some("4f1c"))]
    #[case("https://id.example.org/admin/realms/master/users/4f1c/", Some("4f1c"))]
    #[case("/admin/realms/master/users/abc-123", Some("abc-123"))]
    #[case("", None)]
    #[case("https://", None)]
    fn extracts_trailing_segment(#[case] location: &str, #[case] expected: Option<&str>) {
        assert_eq!(last_path_segment(location), expected);
    }

    #[rstest]
    fn representation_enables_the_account() {
        let user = NewIdentityUser {
            username: "ada.l".to_owned(),
            email: "ada@example.org".to_owned(),
            display_name: "Ada Lovelace".to_owned(),
        };
        let json = serde_json::to_value(UserRepresentation::from(&user)).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "username": "ada.l",
                "email": "ada@example.org",
                "firstName": "Ada Lovelace",
                "enabled": true,
                "emailVerified": false,
            })
        );
    }
}
