//! In-process member store.
//!
//! Keeps members in a map guarded by an async mutex and enforces the same
//! unique columns as the relational schema (`email`, `username`,
//! `identity_id`). Used by the default server wiring and by integration tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::ports::{MemberRepository, MemberRepositoryError};
use crate::domain::{Member, NewMember};

/// Member repository held in memory.
pub struct InMemoryMemberRepository {
    clock: Arc<dyn Clock>,
    members: Mutex<HashMap<Uuid, Member>>,
}

impl InMemoryMemberRepository {
    /// Empty store stamping records with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            members: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored members.
    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.members.lock().await.is_empty()
    }
}

fn duplicate_column(existing: &Member, candidate: &NewMember) -> Option<&'static str> {
    if existing.email.eq_ignore_ascii_case(&candidate.email) {
        Some("email")
    } else if existing.username == candidate.username {
        Some("username")
    } else if existing.identity_id == candidate.identity_id {
        Some("identity_id")
    } else {
        None
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn insert(&self, member: &NewMember) -> Result<Member, MemberRepositoryError> {
        let mut members = self.members.lock().await;
        if let Some(column) = members
            .values()
            .find_map(|existing| duplicate_column(existing, member))
        {
            return Err(MemberRepositoryError::duplicate(column));
        }

        let stored = Member {
            id: Uuid::new_v4(),
            identity_id: member.identity_id.clone(),
            name: member.name.clone(),
            email: member.email.clone(),
            username: member.username.clone(),
            created_at: self.clock.utc(),
        };
        members.insert(stored.id, stored.clone());
        Ok(stored)
    }
}
