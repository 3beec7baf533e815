use std::sync::Arc;

use async_trait::async_trait;

use curator_auth::{PermissionSource, PermissionSourceError, Permissions};
use curator_core::UserId;
use curator_domain::User;
use curator_persistence::{Collection, DocumentStore, Filter, Persistent};

/// Reads permission bits from committed user documents.
///
/// Runs outside any request transaction. Unknown users have no permissions.
pub struct StorePermissionSource {
    store: Arc<dyn DocumentStore>,
}

impl StorePermissionSource {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionSource for StorePermissionSource {
    async fn get(&self, user_id: UserId) -> Result<Permissions, PermissionSourceError> {
        let doc = self
            .store
            .find_one(Collection::Users, &Filter::by_id(user_id))
            .await
            .map_err(|e| PermissionSourceError::Backend(e.to_string()))?;

        match doc {
            Some(doc) => User::from_document(doc)
                .map(|user| user.permissions)
                .map_err(|e| PermissionSourceError::Backend(e.to_string())),
            None => Ok(Permissions::NONE),
        }
    }
}
