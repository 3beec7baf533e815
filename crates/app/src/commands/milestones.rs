use chrono::{DateTime, Utc};

use curator_core::{AchievementId, UserId};
use curator_domain::{Achievement, Milestone};
use curator_persistence::Session;

use crate::error::AppError;

/// Record `milestone` for `user_id` unless it was already reached.
///
/// Returns the id of the new achievement, or `None` for a repeat. The unique
/// (user, milestone) index catches a concurrent duplicate at commit.
pub(super) async fn unlock(
    session: &mut Session,
    user_id: UserId,
    milestone: Option<Milestone>,
    now: DateTime<Utc>,
) -> Result<Option<AchievementId>, AppError> {
    let Some(milestone) = milestone else {
        return Ok(None);
    };

    let mut achievements = session.achievements();
    if achievements.by_user_and_milestone(user_id, milestone).await?.is_some() {
        tracing::debug!(%user_id, %milestone, "milestone already reached");
        return Ok(None);
    }

    let achievement = Achievement::unlock(user_id, milestone, now);
    let id = achievement.id;
    achievements.save(achievement)?;
    Ok(Some(id))
}
