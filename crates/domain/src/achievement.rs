//! Achievements unlocked by moderation milestones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use curator_core::{AchievementId, Entity, UserId};

/// Milestone a user can reach at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Milestone {
    #[serde(rename = "accepted_1")]
    Accepted1,
    #[serde(rename = "accepted_10")]
    Accepted10,
    #[serde(rename = "accepted_50")]
    Accepted50,
    #[serde(rename = "accepted_100")]
    Accepted100,
    #[serde(rename = "rejected_1")]
    Rejected1,
    #[serde(rename = "rejected_10")]
    Rejected10,
}

impl Milestone {
    /// Milestone reached exactly at this accepted-contribution count, if any.
    pub fn for_accepted_count(count: u32) -> Option<Self> {
        match count {
            1 => Some(Self::Accepted1),
            10 => Some(Self::Accepted10),
            50 => Some(Self::Accepted50),
            100 => Some(Self::Accepted100),
            _ => None,
        }
    }

    /// Milestone reached exactly at this rejected-contribution count, if any.
    pub fn for_rejected_count(count: u32) -> Option<Self> {
        match count {
            1 => Some(Self::Rejected1),
            10 => Some(Self::Rejected10),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted1 => "accepted_1",
            Self::Accepted10 => "accepted_10",
            Self::Accepted50 => "accepted_50",
            Self::Accepted100 => "accepted_100",
            Self::Rejected1 => "rejected_1",
            Self::Rejected10 => "rejected_10",
        }
    }
}

impl core::fmt::Display for Milestone {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: AchievementId,
    pub user_id: UserId,
    pub achieved: Milestone,
    pub created_at: DateTime<Utc>,
}

impl Achievement {
    pub fn unlock(user_id: UserId, achieved: Milestone, now: DateTime<Utc>) -> Self {
        Self {
            id: AchievementId::new(),
            user_id,
            achieved,
            created_at: now,
        }
    }
}

impl Entity for Achievement {
    type Id = AchievementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestones_fire_only_on_exact_thresholds() {
        assert_eq!(Milestone::for_accepted_count(10), Some(Milestone::Accepted10));
        assert_eq!(Milestone::for_accepted_count(9), None);
        assert_eq!(Milestone::for_accepted_count(11), None);
        assert_eq!(Milestone::for_rejected_count(1), Some(Milestone::Rejected1));
        assert_eq!(Milestone::for_rejected_count(0), None);
    }

    #[test]
    fn wire_value_matches_as_str() {
        for m in [Milestone::Accepted1, Milestone::Accepted100, Milestone::Rejected10] {
            assert_eq!(serde_json::to_value(m).unwrap(), serde_json::json!(m.as_str()));
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn walking_the_counter_reaches_each_milestone_once(upto in 0u32..200) {
                let reached: Vec<_> = (1..=upto).filter_map(Milestone::for_accepted_count).collect();
                let mut deduped = reached.clone();
                deduped.dedup();
                prop_assert_eq!(&reached, &deduped);
                prop_assert_eq!(reached.len(), [1, 10, 50, 100].iter().filter(|t| **t <= upto).count());
            }
        }
    }
}
