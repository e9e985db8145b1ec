use serde::Deserialize;

use crate::db::types::{AchievementKind, AchievementStatus};

#[derive(Debug, Deserialize)]
pub(super) struct ListAchievementsQuery {
    #[serde(default)]
    pub(super) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(super) limit: i64,
    #[serde(default)]
    pub(super) status: Option<AchievementStatus>,
    #[serde(default)]
    pub(super) kind: Option<AchievementKind>,
    #[serde(default)]
    #[serde(alias = "ownerId")]
    pub(super) owner_id: Option<String>,
    #[serde(default)]
    pub(super) search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PageQuery {
    #[serde(default)]
    pub(super) skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    pub(super) limit: i64,
}
