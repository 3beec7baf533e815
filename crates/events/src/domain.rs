//! Events emitted by moderation use cases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use curator_core::{AchievementId, UserId};
use curator_domain::{Achievement, Milestone};

use crate::event::Event;

/// A user reached a milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementUnlocked {
    pub achievement_id: AchievementId,
    pub user_id: UserId,
    pub achieved: Milestone,
    pub occurred_at: DateTime<Utc>,
}

impl From<&Achievement> for AchievementUnlocked {
    fn from(a: &Achievement) -> Self {
        Self {
            achievement_id: a.id,
            user_id: a.user_id,
            achieved: a.achieved,
            occurred_at: a.created_at,
        }
    }
}

/// Every outbound event the application publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DomainEvent {
    AchievementUnlocked(AchievementUnlocked),
}

impl Event for DomainEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::AchievementUnlocked(_) => "achievement.unlocked",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            Self::AchievementUnlocked(e) => e.occurred_at,
        }
    }
}

impl From<AchievementUnlocked> for DomainEvent {
    fn from(e: AchievementUnlocked) -> Self {
        Self::AchievementUnlocked(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::EventEnvelope;
    use uuid::Uuid;

    #[test]
    fn envelope_carries_type_and_correlation() {
        let achievement = Achievement::unlock(UserId::new(), Milestone::Accepted1, Utc::now());
        let correlation = Uuid::now_v7();
        let env = EventEnvelope::wrap(correlation, DomainEvent::from(AchievementUnlocked::from(&achievement)));

        assert_eq!(env.event_type(), "achievement.unlocked");
        assert_eq!(env.correlation_id(), correlation);
        assert_eq!(env.occurred_at(), achievement.created_at);
    }

    #[test]
    fn serializes_with_type_tag() {
        let achievement = Achievement::unlock(UserId::new(), Milestone::Rejected10, Utc::now());
        let event = DomainEvent::from(AchievementUnlocked::from(&achievement));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "achievement_unlocked");
        assert_eq!(json["data"]["achieved"], "rejected_10");
    }
}
