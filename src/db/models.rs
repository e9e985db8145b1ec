use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::{Date, PrimitiveDateTime};

use crate::db::types::{AchievementKind, AchievementStatus, MediaKind, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Achievement {
    pub(crate) id: String,
    pub(crate) owner_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) content: String,
    pub(crate) kind: AchievementKind,
    pub(crate) status: AchievementStatus,
    pub(crate) award_level: Option<String>,
    pub(crate) achieved_on: Option<Date>,
    pub(crate) tags: Json<Vec<String>>,
    pub(crate) review_comment: Option<String>,
    pub(crate) reviewed_by: Option<String>,
    pub(crate) reviewed_at: Option<PrimitiveDateTime>,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) published_at: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AchievementMedia {
    pub(crate) id: String,
    pub(crate) achievement_id: String,
    pub(crate) filename: String,
    pub(crate) file_path: String,
    pub(crate) file_size: i64,
    pub(crate) mime_type: String,
    pub(crate) media_kind: MediaKind,
    pub(crate) checksum: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) uploaded_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AchievementReview {
    pub(crate) id: String,
    pub(crate) achievement_id: String,
    pub(crate) actor_id: String,
    pub(crate) transition: String,
    pub(crate) from_status: AchievementStatus,
    pub(crate) to_status: AchievementStatus,
    pub(crate) comment: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}
