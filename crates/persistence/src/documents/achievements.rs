use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use curator_core::{AchievementId, UserId};
use curator_domain::{Achievement, Milestone};

use crate::committer::AchievementCommitter;
use crate::persistent::persistent;
use crate::store::Collection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementDocument {
    pub id: AchievementId,
    pub user_id: UserId,
    pub achieved: Milestone,
    pub created_at: DateTime<Utc>,
}

impl From<&Achievement> for AchievementDocument {
    fn from(a: &Achievement) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            achieved: a.achieved,
            created_at: a.created_at,
        }
    }
}

impl From<AchievementDocument> for Achievement {
    fn from(d: AchievementDocument) -> Self {
        Self {
            id: d.id,
            user_id: d.user_id,
            achieved: d.achieved,
            created_at: d.created_at,
        }
    }
}

persistent!(
    Achievement,
    AchievementDocument,
    Collection::Achievements,
    "achievement",
    AchievementCommitter,
    achievements
);
