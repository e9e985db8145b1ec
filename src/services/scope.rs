use crate::db::models::{Achievement, User};
use crate::db::types::{AchievementStatus, UserRole};

/// Which achievements a caller may see. Applied as a SQL predicate for lists and checked
/// directly for single records so both paths agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ListScope {
    /// Approved records only; anonymous visitors.
    Public,
    /// Own records in any status plus everyone's approved records.
    OwnOrApproved { user_id: String },
    /// Everything except other users' drafts.
    ExcludeOthersDrafts { user_id: String },
    Everything,
}

impl ListScope {
    pub(crate) fn for_user(user: &User) -> Self {
        match user.role {
            UserRole::Student => Self::OwnOrApproved { user_id: user.id.clone() },
            UserRole::Teacher => Self::ExcludeOthersDrafts { user_id: user.id.clone() },
            UserRole::Admin => Self::Everything,
        }
    }

    pub(crate) fn can_see(&self, achievement: &Achievement) -> bool {
        match self {
            Self::Public => achievement.status == AchievementStatus::Approved,
            Self::OwnOrApproved { user_id } => {
                achievement.owner_id == *user_id
                    || achievement.status == AchievementStatus::Approved
            }
            Self::ExcludeOthersDrafts { user_id } => {
                achievement.owner_id == *user_id || achievement.status != AchievementStatus::Draft
            }
            Self::Everything => true,
        }
    }
}
