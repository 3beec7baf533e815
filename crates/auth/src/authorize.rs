use thiserror::Error;

use crate::Permissions;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission(s) '{missing}' (granted: '{granted}')")]
    Forbidden {
        required: Permissions,
        granted: Permissions,
        missing: Permissions,
    },
}

/// Command-side authorization contract (checked at the command boundary).
///
/// Implement this on commands that require permissions. The pipeline's
/// authorization stage enforces it before the command reaches a transaction.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> Permissions;
}

/// Check a caller's permission bits against the bits a command requires.
///
/// - No IO
/// - No panics
/// - No business logic (pure mask check)
pub fn authorize(granted: Permissions, required: Permissions) -> Result<(), AuthzError> {
    if (granted & required) == required {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            required,
            granted,
            missing: required.difference(granted),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_superset_grants_pass() {
        assert!(authorize(Permissions::MODERATE_MOVIES, Permissions::MODERATE_MOVIES).is_ok());
        assert!(authorize(Permissions::ADMIN, Permissions::MODERATE_PERSONS).is_ok());
        assert!(authorize(Permissions::NONE, Permissions::NONE).is_ok());
    }

    #[test]
    fn partial_grant_is_forbidden() {
        let required = Permissions::MODERATE_MOVIES | Permissions::CONTRIBUTE_MOVIES;
        let err = authorize(Permissions::CONTRIBUTE_MOVIES, required).unwrap_err();
        let AuthzError::Forbidden { missing, .. } = err;
        assert_eq!(missing, Permissions::MODERATE_MOVIES);
    }
}
