use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::achievements::AchievementFields;
use crate::schemas::achievement::{
    AchievementCreate, AchievementResponse, AchievementUpdate, ReviewEntryResponse,
};
use crate::services::content::validate_content;
use crate::services::workflow::{self, EditOutcome, TransitionPlan};

use super::super::helpers;

pub(in crate::api::achievements) async fn create_achievement(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AchievementCreate>,
) -> Result<(StatusCode, Json<AchievementResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if payload.title.trim().is_empty() || payload.description.trim().is_empty() {
        return Err(ApiError::BadRequest("Title and description cannot be blank".to_string()));
    }
    validate_content(&payload.content)?;

    let achieved_on =
        payload.achieved_on.as_deref().map(helpers::parse_achieved_on).transpose()?;
    let award_level = helpers::merge_optional(payload.award_level, None);
    let tags = helpers::normalize_tags(payload.tags);
    let achievement_id = Uuid::new_v4().to_string();

    let achievement = repositories::achievements::create(
        state.db(),
        &achievement_id,
        &user.id,
        AchievementFields {
            title: payload.title.trim(),
            description: payload.description.trim(),
            content: &payload.content,
            kind: payload.kind,
            award_level: award_level.as_deref(),
            achieved_on,
            tags: &tags,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create achievement"))?;

    tracing::info!(
        achievement_id = %achievement.id,
        actor_id = %user.id,
        action = "create",
        "Achievement created"
    );

    let response = AchievementResponse::from_db(achievement)
        .with_owner_name(user.full_name)
        .with_media(Vec::new());
    Ok((StatusCode::CREATED, Json(response)))
}

pub(in crate::api::achievements) async fn get_achievement(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AchievementResponse>, ApiError> {
    let row = helpers::load_visible(&state, &user, &achievement_id).await?;
    helpers::detail_response(&state, row).await.map(Json)
}

pub(in crate::api::achievements) async fn update_achievement(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AchievementUpdate>,
) -> Result<Json<AchievementResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if let Some(content) = payload.content.as_deref() {
        validate_content(content)?;
    }

    let row = helpers::load_visible(&state, &user, &achievement_id).await?;
    let current = row.achievement;
    let outcome = workflow::plan_edit(&current, &user)?;

    let achieved_on = match payload.achieved_on.as_deref().map(str::trim) {
        None => current.achieved_on,
        Some("") => None,
        Some(value) => Some(helpers::parse_achieved_on(value)?),
    };
    let award_level = helpers::merge_optional(payload.award_level, current.award_level.clone());
    let tags = payload.tags.map(helpers::normalize_tags).unwrap_or_else(|| current.tags.0.clone());
    let title = payload.title.as_deref().map(str::trim).unwrap_or(&current.title);
    let description =
        payload.description.as_deref().map(str::trim).unwrap_or(&current.description);
    if title.is_empty() || description.is_empty() {
        return Err(ApiError::BadRequest("Title and description cannot be blank".to_string()));
    }

    let reopen_plan =
        (outcome == EditOutcome::ReopenToDraft).then(TransitionPlan::reopen_on_edit);
    let now = primitive_now_utc();

    let updated = repositories::achievements::apply_edit(
        state.db(),
        &achievement_id,
        current.status,
        AchievementFields {
            title,
            description,
            content: payload.content.as_deref().unwrap_or(&current.content),
            kind: payload.kind.unwrap_or(current.kind),
            award_level: award_level.as_deref(),
            achieved_on,
            tags: &tags,
        },
        reopen_plan.as_ref().map(|plan| plan.status_change(&user.id, now)),
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update achievement"))?
    .ok_or_else(|| {
        ApiError::Conflict("Achievement was changed concurrently; reload and retry".to_string())
    })?;

    if let Some(plan) = &reopen_plan {
        metrics::record_transition(plan.transition.as_str());
    }
    tracing::info!(
        achievement_id = %achievement_id,
        actor_id = %user.id,
        action = "edit",
        reopened = reopen_plan.is_some(),
        "Achievement updated"
    );

    let media = helpers::media_for(&state, &achievement_id).await?;
    Ok(Json(
        AchievementResponse::from_db(updated).with_owner_name(row.owner_name).with_media(media),
    ))
}

pub(in crate::api::achievements) async fn delete_achievement(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let row = helpers::load_visible(&state, &user, &achievement_id).await?;
    workflow::ensure_can_delete(&row.achievement, &user)?;

    let object_keys = repositories::media::list_paths_by_achievement(state.db(), &achievement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list achievement media"))?;

    repositories::achievements::delete_by_id(state.db(), &achievement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete achievement"))?;

    if let Some(storage) = state.storage() {
        storage.delete_objects_best_effort(object_keys).await;
    }

    tracing::info!(
        achievement_id = %achievement_id,
        actor_id = %user.id,
        action = "delete",
        "Achievement deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

pub(in crate::api::achievements) async fn history(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ReviewEntryResponse>>, ApiError> {
    helpers::load_visible(&state, &user, &achievement_id).await?;

    let rows = repositories::reviews::list_by_achievement(state.db(), &achievement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load achievement history"))?;

    Ok(Json(
        rows.into_iter()
            .map(|row| ReviewEntryResponse::from_db(row.review, row.actor_name))
            .collect(),
    ))
}
