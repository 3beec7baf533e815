use core::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Permission bitmask.
///
/// Each bit grants one capability. A user document stores the raw `u64`;
/// commands declare the bits they need and authorization is a plain mask
/// check (`granted & required == required`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(u64);

impl Permissions {
    pub const NONE: Self = Self(0);
    /// Submit add/edit movie contributions.
    pub const CONTRIBUTE_MOVIES: Self = Self(1 << 0);
    /// Submit add/edit person contributions.
    pub const CONTRIBUTE_PERSONS: Self = Self(1 << 1);
    /// Accept or reject movie contributions.
    pub const MODERATE_MOVIES: Self = Self(1 << 2);
    /// Accept or reject person contributions.
    pub const MODERATE_PERSONS: Self = Self(1 << 3);
    /// Register users and change their permissions.
    pub const MANAGE_USERS: Self = Self(1 << 4);

    pub const CONTRIBUTOR: Self = Self(Self::CONTRIBUTE_MOVIES.0 | Self::CONTRIBUTE_PERSONS.0);
    pub const MODERATOR: Self =
        Self(Self::CONTRIBUTOR.0 | Self::MODERATE_MOVIES.0 | Self::MODERATE_PERSONS.0);
    pub const ADMIN: Self = Self(Self::MODERATOR.0 | Self::MANAGE_USERS.0);

    const NAMED: [(Self, &'static str); 5] = [
        (Self::CONTRIBUTE_MOVIES, "contribute_movies"),
        (Self::CONTRIBUTE_PERSONS, "contribute_persons"),
        (Self::MODERATE_MOVIES, "moderate_movies"),
        (Self::MODERATE_PERSONS, "moderate_persons"),
        (Self::MANAGE_USERS, "manage_users"),
    ];

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Bits present in `self` but not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Human-readable names of the known bits that are set.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(perm, _)| self.contains(*perm))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Permissions {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl core::fmt::Display for Permissions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_supersets() {
        assert!(Permissions::ADMIN.contains(Permissions::MODERATOR));
        assert!(Permissions::MODERATOR.contains(Permissions::CONTRIBUTOR));
        assert!(!Permissions::CONTRIBUTOR.contains(Permissions::MODERATE_MOVIES));
    }

    #[test]
    fn difference_reports_missing_bits() {
        let missing = Permissions::MODERATOR.difference(Permissions::CONTRIBUTOR);
        assert_eq!(missing, Permissions::MODERATE_MOVIES | Permissions::MODERATE_PERSONS);
        assert_eq!(missing.to_string(), "moderate_movies|moderate_persons");
    }

    #[test]
    fn serializes_as_raw_bits() {
        let json = serde_json::to_value(Permissions::CONTRIBUTOR).unwrap();
        assert_eq!(json, serde_json::json!(3));
    }
}
