use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::repositories;
use crate::schemas::achievement::{AchievementResponse, TransitionRequest};
use crate::services::workflow::{self, Transition};

use super::super::helpers;

type TransitionBody = Option<Json<TransitionRequest>>;

pub(in crate::api::achievements) async fn submit(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    body: TransitionBody,
) -> Result<Json<AchievementResponse>, ApiError> {
    run_transition(&state, &user, &achievement_id, Transition::Submit, body).await
}

pub(in crate::api::achievements) async fn withdraw(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    body: TransitionBody,
) -> Result<Json<AchievementResponse>, ApiError> {
    run_transition(&state, &user, &achievement_id, Transition::Withdraw, body).await
}

pub(in crate::api::achievements) async fn approve(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    body: TransitionBody,
) -> Result<Json<AchievementResponse>, ApiError> {
    run_transition(&state, &user, &achievement_id, Transition::Approve, body).await
}

pub(in crate::api::achievements) async fn reject(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    body: TransitionBody,
) -> Result<Json<AchievementResponse>, ApiError> {
    run_transition(&state, &user, &achievement_id, Transition::Reject, body).await
}

pub(in crate::api::achievements) async fn reopen(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    body: TransitionBody,
) -> Result<Json<AchievementResponse>, ApiError> {
    run_transition(&state, &user, &achievement_id, Transition::Reopen, body).await
}

pub(in crate::api::achievements) async fn revoke(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    body: TransitionBody,
) -> Result<Json<AchievementResponse>, ApiError> {
    run_transition(&state, &user, &achievement_id, Transition::Revoke, body).await
}

async fn run_transition(
    state: &AppState,
    user: &User,
    achievement_id: &str,
    transition: Transition,
    body: TransitionBody,
) -> Result<Json<AchievementResponse>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    request.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let row = helpers::load_visible(state, user, achievement_id).await?;
    let plan = workflow::plan_transition(&row.achievement, user, transition, request.comment)?;

    let updated = repositories::achievements::apply_transition(
        state.db(),
        achievement_id,
        plan.status_change(&user.id, primitive_now_utc()),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to change achievement status"))?
    .ok_or_else(|| {
        ApiError::Conflict("Achievement status changed concurrently; reload and retry".to_string())
    })?;

    metrics::record_transition(transition.as_str());
    tracing::info!(
        achievement_id = %achievement_id,
        actor_id = %user.id,
        action = transition.as_str(),
        from = plan.from.as_str(),
        to = plan.to.as_str(),
        "Achievement status changed"
    );

    let media = helpers::media_for(state, achievement_id).await?;
    Ok(Json(
        AchievementResponse::from_db(updated).with_owner_name(row.owner_name).with_media(media),
    ))
}
