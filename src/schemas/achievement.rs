use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::core::time::{format_date, format_primitive};
use crate::db::models::{Achievement, AchievementReview};
use crate::db::types::{AchievementKind, AchievementStatus};
use crate::schemas::media::MediaResponse;

pub(crate) const MAX_TAGS: usize = 20;
pub(crate) const MAX_TAG_CHARS: usize = 40;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AchievementCreate {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: String,
    #[validate(length(min = 1, max = 5000, message = "description must be 1-5000 characters"))]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) content: String,
    #[serde(default = "default_kind")]
    pub(crate) kind: AchievementKind,
    #[serde(default)]
    #[serde(alias = "awardLevel")]
    #[validate(length(max = 100, message = "award_level must be at most 100 characters"))]
    pub(crate) award_level: Option<String>,
    #[serde(default)]
    #[serde(alias = "achievedOn")]
    pub(crate) achieved_on: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub(crate) tags: Vec<String>,
}

/// Partial edit. For `award_level` and `achieved_on` an empty string clears the value.
#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct AchievementUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "description must be 1-5000 characters"))]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) content: Option<String>,
    #[serde(default)]
    pub(crate) kind: Option<AchievementKind>,
    #[serde(default)]
    #[serde(alias = "awardLevel")]
    #[validate(length(max = 100, message = "award_level must be at most 100 characters"))]
    pub(crate) award_level: Option<String>,
    #[serde(default)]
    #[serde(alias = "achievedOn")]
    pub(crate) achieved_on: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub(crate) tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct TransitionRequest {
    #[serde(default)]
    #[validate(length(max = 2000, message = "comment must be at most 2000 characters"))]
    pub(crate) comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AchievementResponse {
    pub(crate) id: String,
    pub(crate) owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) owner_name: Option<String>,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) content: String,
    pub(crate) kind: AchievementKind,
    pub(crate) status: AchievementStatus,
    pub(crate) award_level: Option<String>,
    pub(crate) achieved_on: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) review_comment: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<String>,
    pub(crate) submitted_at: Option<String>,
    pub(crate) published_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) media: Option<Vec<MediaResponse>>,
}

impl AchievementResponse {
    pub(crate) fn from_db(achievement: Achievement) -> Self {
        Self {
            id: achievement.id,
            owner_id: achievement.owner_id,
            owner_name: None,
            title: achievement.title,
            description: achievement.description,
            content: achievement.content,
            kind: achievement.kind,
            status: achievement.status,
            award_level: achievement.award_level,
            achieved_on: achievement.achieved_on.map(format_date),
            tags: achievement.tags.0,
            review_comment: achievement.review_comment,
            reviewed_by: achievement.reviewed_by,
            reviewed_at: achievement.reviewed_at.map(format_primitive),
            submitted_at: achievement.submitted_at.map(format_primitive),
            published_at: achievement.published_at.map(format_primitive),
            created_at: format_primitive(achievement.created_at),
            updated_at: format_primitive(achievement.updated_at),
            media: None,
        }
    }

    pub(crate) fn with_owner_name(mut self, owner_name: String) -> Self {
        self.owner_name = Some(owner_name);
        self
    }

    pub(crate) fn with_media(mut self, media: Vec<MediaResponse>) -> Self {
        self.media = Some(media);
        self
    }
}

/// List entry; omits the rich content body.
#[derive(Debug, Serialize)]
pub(crate) struct AchievementSummary {
    pub(crate) id: String,
    pub(crate) owner_id: String,
    pub(crate) owner_name: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) kind: AchievementKind,
    pub(crate) status: AchievementStatus,
    pub(crate) award_level: Option<String>,
    pub(crate) achieved_on: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) submitted_at: Option<String>,
    pub(crate) published_at: Option<String>,
    pub(crate) updated_at: String,
}

impl AchievementSummary {
    pub(crate) fn from_db(achievement: Achievement, owner_name: String) -> Self {
        Self {
            id: achievement.id,
            owner_id: achievement.owner_id,
            owner_name,
            title: achievement.title,
            description: achievement.description,
            kind: achievement.kind,
            status: achievement.status,
            award_level: achievement.award_level,
            achieved_on: achievement.achieved_on.map(format_date),
            tags: achievement.tags.0,
            submitted_at: achievement.submitted_at.map(format_primitive),
            published_at: achievement.published_at.map(format_primitive),
            updated_at: format_primitive(achievement.updated_at),
        }
    }
}

/// Showcase view of an approved record; review details stay internal.
#[derive(Debug, Serialize)]
pub(crate) struct PublicAchievementResponse {
    pub(crate) id: String,
    pub(crate) owner_name: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) content: String,
    pub(crate) kind: AchievementKind,
    pub(crate) award_level: Option<String>,
    pub(crate) achieved_on: Option<String>,
    pub(crate) tags: Vec<String>,
    pub(crate) published_at: Option<String>,
    pub(crate) media: Vec<MediaResponse>,
}

impl PublicAchievementResponse {
    pub(crate) fn from_db(
        achievement: Achievement,
        owner_name: String,
        media: Vec<MediaResponse>,
    ) -> Self {
        Self {
            id: achievement.id,
            owner_name,
            title: achievement.title,
            description: achievement.description,
            content: achievement.content,
            kind: achievement.kind,
            award_level: achievement.award_level,
            achieved_on: achievement.achieved_on.map(format_date),
            tags: achievement.tags.0,
            published_at: achievement.published_at.map(format_primitive),
            media,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ReviewEntryResponse {
    pub(crate) id: String,
    pub(crate) transition: String,
    pub(crate) from_status: AchievementStatus,
    pub(crate) to_status: AchievementStatus,
    pub(crate) actor_id: String,
    pub(crate) actor_name: String,
    pub(crate) comment: Option<String>,
    pub(crate) created_at: String,
}

impl ReviewEntryResponse {
    pub(crate) fn from_db(review: AchievementReview, actor_name: String) -> Self {
        Self {
            id: review.id,
            transition: review.transition,
            from_status: review.from_status,
            to_status: review.to_status,
            actor_id: review.actor_id,
            actor_name,
            comment: review.comment,
            created_at: format_primitive(review.created_at),
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub(crate) struct StatusCountsResponse {
    pub(crate) draft: i64,
    pub(crate) pending: i64,
    pub(crate) approved: i64,
    pub(crate) rejected: i64,
    pub(crate) total: i64,
}

impl StatusCountsResponse {
    pub(crate) fn from_counts(counts: &[(AchievementStatus, i64)]) -> Self {
        let mut response = Self::default();
        for (status, count) in counts {
            match status {
                AchievementStatus::Draft => response.draft += count,
                AchievementStatus::Pending => response.pending += count,
                AchievementStatus::Approved => response.approved += count,
                AchievementStatus::Rejected => response.rejected += count,
            }
            response.total += count;
        }
        response
    }
}

fn default_kind() -> AchievementKind {
    AchievementKind::Other
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::new("too_many_tags")
            .with_message(format!("at most {MAX_TAGS} tags are allowed").into()));
    }
    let bad_tag = tags.iter().any(|tag| {
        let len = tag.trim().chars().count();
        len == 0 || len > MAX_TAG_CHARS
    });
    if bad_tag {
        return Err(ValidationError::new("tag_length")
            .with_message(format!("each tag must be 1-{MAX_TAG_CHARS} characters").into()));
    }
    Ok(())
}
