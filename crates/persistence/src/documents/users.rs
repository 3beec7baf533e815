use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use curator_auth::Permissions;
use curator_core::UserId;
use curator_domain::User;

use crate::committer::UserCommitter;
use crate::persistent::persistent;
use crate::store::Collection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub permissions: Permissions,
    pub rating: i64,
    pub accepted_contributions: u32,
    pub rejected_contributions: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDocument {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            permissions: u.permissions,
            rating: u.rating,
            accepted_contributions: u.accepted_contributions,
            rejected_contributions: u.rejected_contributions,
            created_at: u.created_at,
        }
    }
}

impl From<UserDocument> for User {
    fn from(d: UserDocument) -> Self {
        Self {
            id: d.id,
            name: d.name,
            email: d.email,
            permissions: d.permissions,
            rating: d.rating,
            accepted_contributions: d.accepted_contributions,
            rejected_contributions: d.rejected_contributions,
            created_at: d.created_at,
        }
    }
}

persistent!(User, UserDocument, Collection::Users, "user", UserCommitter, users);

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::persistent::Persistent;
    use crate::store::LOCK_FIELD;

    use super::*;

    #[test]
    fn lock_stamp_is_ignored_on_read_and_never_written() {
        let user = User::register(UserId::new(), "alice", "Alice@Example.com", Permissions::MODERATOR, Utc::now()).unwrap();
        let mut doc = user.to_document().unwrap();
        assert!(!doc.contains_key(LOCK_FIELD));
        assert_eq!(doc["email"], json!("alice@example.com"));
        assert_eq!(doc["id"], json!(user.id.to_string()));

        doc.insert(LOCK_FIELD.into(), json!("locked"));
        let back = User::from_document(doc).unwrap();
        assert_eq!(back, user);
    }
}
