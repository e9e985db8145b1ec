//! Status workflow for achievements.
//!
//! ```text
//! draft --submit--> pending --approve--> approved
//!   ^                 |  \                  |
//!   |             withdraw reject          revoke
//!   |                 v     v               v
//!   +----reopen---- draft  rejected <-------+
//! ```
//!
//! Reviewers (teachers and admins) publish their own drafts directly: `submit` takes them from
//! draft to approved without a review round.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use time::PrimitiveDateTime;

use crate::db::models::{Achievement, User};
use crate::db::types::{AchievementStatus, UserRole};
use crate::repositories::achievements::StatusChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Transition {
    Submit,
    Withdraw,
    Approve,
    Reject,
    Reopen,
    Revoke,
}

impl Transition {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Withdraw => "withdraw",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Reopen => "reopen",
            Self::Revoke => "revoke",
        }
    }

    fn source(self) -> AchievementStatus {
        match self {
            Self::Submit => AchievementStatus::Draft,
            Self::Withdraw | Self::Approve | Self::Reject => AchievementStatus::Pending,
            Self::Reopen => AchievementStatus::Rejected,
            Self::Revoke => AchievementStatus::Approved,
        }
    }

    fn requires_comment(self) -> bool {
        matches!(self, Self::Reject | Self::Revoke)
    }

    /// Transitions that record who reviewed the achievement.
    pub(crate) fn is_review(self) -> bool {
        matches!(self, Self::Approve | Self::Reject | Self::Revoke)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum WorkflowError {
    #[error("Cannot {verb} an achievement in {} status", status.as_str())]
    InvalidState { verb: &'static str, status: AchievementStatus },
    #[error("{0}")]
    NotAllowed(&'static str),
    #[error("A comment is required to {0} an achievement")]
    CommentRequired(&'static str),
    #[error("Title and description are required before submitting")]
    Incomplete,
}

/// A validated status change, ready to be applied with a compare-and-set update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransitionPlan {
    pub(crate) transition: Transition,
    pub(crate) from: AchievementStatus,
    pub(crate) to: AchievementStatus,
    pub(crate) comment: Option<String>,
}

impl TransitionPlan {
    pub(crate) fn publishes(&self) -> bool {
        self.to == AchievementStatus::Approved
    }

    /// The reopen recorded when an owner edits a rejected record.
    pub(crate) fn reopen_on_edit() -> Self {
        Self {
            transition: Transition::Reopen,
            from: AchievementStatus::Rejected,
            to: AchievementStatus::Draft,
            comment: None,
        }
    }

    pub(crate) fn status_change<'a>(
        &'a self,
        actor_id: &'a str,
        now: PrimitiveDateTime,
    ) -> StatusChange<'a> {
        StatusChange {
            transition: self.transition.as_str(),
            from: self.from,
            to: self.to,
            actor_id,
            comment: self.comment.as_deref(),
            stamp_submitted: self.transition == Transition::Submit,
            record_review: self.transition.is_review(),
            clear_comment: self.transition == Transition::Withdraw,
            now,
        }
    }
}

pub(crate) fn plan_transition(
    achievement: &Achievement,
    actor: &User,
    transition: Transition,
    comment: Option<String>,
) -> Result<TransitionPlan, WorkflowError> {
    let from = achievement.status;
    if from != transition.source() {
        return Err(WorkflowError::InvalidState { verb: transition.as_str(), status: from });
    }

    let is_owner = achievement.owner_id == actor.id;
    let to = match transition {
        Transition::Submit => {
            if !is_owner {
                return Err(WorkflowError::NotAllowed("Only the owner can submit an achievement"));
            }
            if achievement.title.trim().is_empty() || achievement.description.trim().is_empty() {
                return Err(WorkflowError::Incomplete);
            }
            if actor.role.is_reviewer() {
                AchievementStatus::Approved
            } else {
                AchievementStatus::Pending
            }
        }
        Transition::Withdraw => {
            if !is_owner {
                return Err(WorkflowError::NotAllowed("Only the owner can withdraw a submission"));
            }
            AchievementStatus::Draft
        }
        Transition::Reopen => {
            if !is_owner {
                return Err(WorkflowError::NotAllowed("Only the owner can reopen an achievement"));
            }
            AchievementStatus::Draft
        }
        Transition::Approve | Transition::Reject => {
            if !actor.role.is_reviewer() {
                return Err(WorkflowError::NotAllowed("Teacher or admin access required"));
            }
            if is_owner {
                return Err(WorkflowError::NotAllowed("You cannot review your own achievement"));
            }
            if transition == Transition::Approve {
                AchievementStatus::Approved
            } else {
                AchievementStatus::Rejected
            }
        }
        Transition::Revoke => {
            if actor.role != UserRole::Admin {
                return Err(WorkflowError::NotAllowed("Admin access required"));
            }
            AchievementStatus::Rejected
        }
    };

    let comment = normalize_comment(comment);
    if transition.requires_comment() && comment.is_none() {
        return Err(WorkflowError::CommentRequired(transition.as_str()));
    }

    Ok(TransitionPlan { transition, from, to, comment })
}

/// What saving an edit does to the record's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EditOutcome {
    KeepStatus,
    /// Owner edited a rejected record; it returns to draft and the change is audited as a reopen.
    ReopenToDraft,
}

/// Admins edit any record, their own included, without touching its status.
pub(crate) fn plan_edit(achievement: &Achievement, actor: &User) -> Result<EditOutcome, WorkflowError> {
    if actor.role == UserRole::Admin {
        return Ok(EditOutcome::KeepStatus);
    }

    if achievement.owner_id != actor.id {
        return Err(WorkflowError::NotAllowed("You can only edit your own achievements"));
    }

    match achievement.status {
        AchievementStatus::Draft => Ok(EditOutcome::KeepStatus),
        AchievementStatus::Rejected => Ok(EditOutcome::ReopenToDraft),
        status => Err(WorkflowError::InvalidState { verb: "edit", status }),
    }
}

pub(crate) fn ensure_can_delete(achievement: &Achievement, actor: &User) -> Result<(), WorkflowError> {
    if actor.role == UserRole::Admin {
        return Ok(());
    }
    if achievement.owner_id != actor.id {
        return Err(WorkflowError::NotAllowed("You can only delete your own achievements"));
    }
    if !achievement.status.is_editable() {
        return Err(WorkflowError::InvalidState { verb: "delete", status: achievement.status });
    }
    Ok(())
}

/// Media follows the same rights as editing, without the reopen side effect.
pub(crate) fn ensure_can_manage_media(
    achievement: &Achievement,
    actor: &User,
) -> Result<(), WorkflowError> {
    plan_edit(achievement, actor).map(|_| ())
}

fn normalize_comment(comment: Option<String>) -> Option<String> {
    comment.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
