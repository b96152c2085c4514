//! Member enrolment across the identity store and the local store.
//!
//! Enrolling a member creates the login in the identity store first, then the
//! member row locally. If the local insert fails, the identity user is deleted
//! again through the dual store coordinator.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::dual_store::DualStoreCoordinator;
use super::ports::{IdentityDirectory, IdentityUserId, MemberRepository, NewIdentityUser};
use super::validation::{
    ValidationRules, Validator, all_of, email, max_length, min_length, pattern, required,
    validate,
};
use super::DomainError;

const ENROL_OPERATION: &str = "enrol member";

/// Stored member record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub identity_id: IdentityUserId,
    pub name: String,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Member row to insert once the identity user exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMember {
    pub identity_id: IdentityUserId,
    pub name: String,
    pub email: String,
    pub username: String,
}

/// Inbound enrolment payload.
///
/// Missing fields decode as empty strings so the validator reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct EnrolMemberRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@example.org")]
    pub email: String,
    #[schema(example = "ada.l")]
    pub username: String,
}

fn username_regex() -> &'static Regex {
    static USERNAME_RE: OnceLock<Regex> = OnceLock::new();
    USERNAME_RE.get_or_init(|| {
        Regex::new("^[a-z0-9._-]+$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

fn enrolment_rules() -> ValidationRules {
    let username: Validator = all_of(vec![
        required(),
        min_length(3),
        pattern(
            username_regex().clone(),
            "Only lowercase letters, digits, '.', '_' and '-' are allowed",
        ),
    ]);
    ValidationRules::new()
        .field("name", all_of(vec![required(), max_length(100)]))
        .field("email", all_of(vec![required(), email()]))
        .field("username", username)
}

/// Enrols members in both stores.
pub struct MemberEnrolment {
    directory: Arc<dyn IdentityDirectory>,
    members: Arc<dyn MemberRepository>,
    coordinator: DualStoreCoordinator,
}

impl MemberEnrolment {
    /// Build the service from its ports.
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        members: Arc<dyn MemberRepository>,
        coordinator: DualStoreCoordinator,
    ) -> Self {
        Self {
            directory,
            members,
            coordinator,
        }
    }

    /// Validate and enrol a member.
    ///
    /// # Errors
    ///
    /// - validation errors listing every invalid field;
    /// - the mapped identity store failure if the user could not be created;
    /// - the local store failure if the member row could not be inserted, in
    ///   which case the identity user has been deleted again (best effort).
    pub async fn enrol(&self, request: EnrolMemberRequest) -> Result<Member, DomainError> {
        let record = serde_json::to_value(&request).map_err(|error| {
            DomainError::internal("Failed to read enrolment request")
                .with_diagnostic(error.to_string())
        })?;
        validate(&record, &enrolment_rules())?;

        let EnrolMemberRequest {
            name,
            email,
            username,
        } = request;
        let identity_user = NewIdentityUser {
            username: username.clone(),
            email: email.clone(),
            display_name: name.clone(),
        };
        let directory = self.directory.as_ref();
        let members = self.members.as_ref();

        self.coordinator
            .run(
                || async move { directory.create_user(&identity_user).await },
                |identity_id: IdentityUserId| async move {
                    let member = NewMember {
                        identity_id,
                        name,
                        email,
                        username,
                    };
                    members.insert(&member).await.map_err(DomainError::from)
                },
                |identity_id: IdentityUserId| async move {
                    directory.delete_user(&identity_id).await
                },
                ENROL_OPERATION,
            )
            .await
    }
}
