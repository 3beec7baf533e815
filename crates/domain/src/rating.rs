//! Contributor rating policy.

use crate::contribution::ContributionKind;

/// Rating granted when a contribution of `kind` is accepted.
pub fn accepted_reward(kind: ContributionKind) -> i64 {
    match kind {
        ContributionKind::AddMovie => 10,
        ContributionKind::AddPerson => 5,
        ContributionKind::EditMovie => 3,
        ContributionKind::EditPerson => 2,
    }
}

/// Rating removed when a contribution of `kind` is rejected.
pub fn rejected_penalty(kind: ContributionKind) -> i64 {
    match kind {
        ContributionKind::AddMovie | ContributionKind::AddPerson => 2,
        ContributionKind::EditMovie | ContributionKind::EditPerson => 1,
    }
}
