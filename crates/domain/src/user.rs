//! Registered users (contributors, moderators, admins).

use chrono::{DateTime, Utc};

use curator_auth::Permissions;
use curator_core::{DomainError, DomainResult, Entity, UserId};

use crate::contribution::ContributionKind;
use crate::rating;

/// User record.
///
/// # Invariants
/// - `name` and `email` are unique across users (enforced by the store).
/// - counters only grow; `rating` moves with moderation outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub permissions: Permissions,
    pub rating: i64,
    pub accepted_contributions: u32,
    pub rejected_contributions: u32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn register(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        permissions: Permissions,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        let email = email.into().trim().to_ascii_lowercase();

        if name.is_empty() || name.chars().count() > 64 {
            return Err(DomainError::validation("user name must be 1..=64 characters"));
        }
        if !is_plausible_email(&email) {
            return Err(DomainError::validation(format!("invalid email '{email}'")));
        }

        Ok(Self {
            id,
            name,
            email,
            permissions,
            rating: 0,
            accepted_contributions: 0,
            rejected_contributions: 0,
            created_at: now,
        })
    }

    /// Credit an accepted contribution. Returns the new accepted count.
    pub fn record_accepted(&mut self, kind: ContributionKind) -> u32 {
        self.accepted_contributions += 1;
        self.rating += rating::accepted_reward(kind);
        self.accepted_contributions
    }

    /// Debit a rejected contribution. Returns the new rejected count.
    pub fn record_rejected(&mut self, kind: ContributionKind) -> u32 {
        self.rejected_contributions += 1;
        self.rating -= rating::rejected_penalty(kind);
        self.rejected_contributions
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}
