use time::Date;

use crate::api::errors::ApiError;
use crate::api::pagination::{self, PaginatedResponse};
use crate::core::state::AppState;
use crate::core::time::{parse_date, today_utc};
use crate::db::models::User;
use crate::repositories;
use crate::repositories::achievements::{AchievementFilter, AchievementRow};
use crate::schemas::achievement::{AchievementResponse, AchievementSummary};
use crate::schemas::media::MediaResponse;
use crate::services::scope::ListScope;

/// Loads an achievement the caller may see. Hidden records are reported as missing.
pub(crate) async fn load_visible(
    state: &AppState,
    user: &User,
    achievement_id: &str,
) -> Result<AchievementRow, ApiError> {
    load_in_scope(state, &ListScope::for_user(user), achievement_id).await
}

pub(crate) async fn load_in_scope(
    state: &AppState,
    scope: &ListScope,
    achievement_id: &str,
) -> Result<AchievementRow, ApiError> {
    let row = repositories::achievements::find_row_by_id(state.db(), achievement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch achievement"))?
        .ok_or_else(ApiError::achievement_not_found)?;

    if scope.can_see(&row.achievement) {
        Ok(row)
    } else {
        Err(ApiError::achievement_not_found())
    }
}

pub(crate) async fn media_for(
    state: &AppState,
    achievement_id: &str,
) -> Result<Vec<MediaResponse>, ApiError> {
    let media = repositories::media::list_by_achievement(state.db(), achievement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list achievement media"))?;
    Ok(media.into_iter().map(MediaResponse::from_db).collect())
}

pub(super) async fn detail_response(
    state: &AppState,
    row: AchievementRow,
) -> Result<AchievementResponse, ApiError> {
    let media = media_for(state, &row.achievement.id).await?;
    Ok(AchievementResponse::from_db(row.achievement).with_owner_name(row.owner_name).with_media(media))
}

pub(crate) async fn list_in_scope(
    state: &AppState,
    scope: &ListScope,
    filter: &AchievementFilter,
    skip: i64,
    limit: i64,
) -> Result<PaginatedResponse<AchievementSummary>, ApiError> {
    let (skip, limit) = pagination::normalize(skip, limit);

    let rows = repositories::achievements::list(state.db(), scope, filter, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list achievements"))?;
    let total_count = repositories::achievements::count(state.db(), scope, filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count achievements"))?;

    Ok(PaginatedResponse { items: summaries(rows), total_count, skip, limit })
}

pub(crate) fn summaries(rows: Vec<AchievementRow>) -> Vec<AchievementSummary> {
    rows.into_iter().map(|row| AchievementSummary::from_db(row.achievement, row.owner_name)).collect()
}

/// Parses `YYYY-MM-DD`; dates in the future are refused.
pub(super) fn parse_achieved_on(value: &str) -> Result<Date, ApiError> {
    let date = parse_date(value.trim())
        .map_err(|_| ApiError::BadRequest("achieved_on must be a YYYY-MM-DD date".to_string()))?;
    if date > today_utc() {
        return Err(ApiError::BadRequest("achieved_on cannot be in the future".to_string()));
    }
    Ok(date)
}

/// Interprets an optional-clearable text field: missing keeps, blank clears.
pub(super) fn merge_optional(update: Option<String>, current: Option<String>) -> Option<String> {
    match update {
        None => current,
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value.trim().to_string()),
    }
}

pub(super) fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !normalized.iter().any(|existing| existing.eq_ignore_ascii_case(&tag)) {
            normalized.push(tag);
        }
    }
    normalized
}
