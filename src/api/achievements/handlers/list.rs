use axum::{
    extract::{Query, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentTeacher, CurrentUser};
use crate::api::pagination::{self, PaginatedResponse};
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::achievements::AchievementFilter;
use crate::schemas::achievement::{AchievementSummary, StatusCountsResponse};
use crate::services::scope::ListScope;

use super::super::helpers;
use super::super::queries::{ListAchievementsQuery, PageQuery};

pub(in crate::api::achievements) async fn list_achievements(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListAchievementsQuery>,
) -> Result<Json<PaginatedResponse<AchievementSummary>>, ApiError> {
    let scope = ListScope::for_user(&user);
    let filter = AchievementFilter {
        status: params.status,
        kind: params.kind,
        owner_id: params.owner_id,
        search: params.search,
    };
    helpers::list_in_scope(&state, &scope, &filter, params.skip, params.limit).await.map(Json)
}

pub(in crate::api::achievements) async fn list_mine(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(params): Query<ListAchievementsQuery>,
) -> Result<Json<PaginatedResponse<AchievementSummary>>, ApiError> {
    let filter = AchievementFilter {
        status: params.status,
        kind: params.kind,
        owner_id: Some(user.id.clone()),
        search: params.search,
    };
    helpers::list_in_scope(&state, &ListScope::for_user(&user), &filter, params.skip, params.limit)
        .await
        .map(Json)
}

pub(in crate::api::achievements) async fn review_queue(
    CurrentTeacher(reviewer): CurrentTeacher,
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<AchievementSummary>>, ApiError> {
    let (skip, limit) = pagination::normalize(params.skip, params.limit);

    let rows = repositories::achievements::review_queue(state.db(), &reviewer.id, skip, limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load review queue"))?;
    let total_count = repositories::achievements::count_review_queue(state.db(), &reviewer.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count review queue"))?;

    Ok(Json(PaginatedResponse { items: helpers::summaries(rows), total_count, skip, limit }))
}

pub(in crate::api::achievements) async fn stats(
    CurrentTeacher(reviewer): CurrentTeacher,
    State(state): State<AppState>,
) -> Result<Json<StatusCountsResponse>, ApiError> {
    let counts =
        repositories::achievements::count_by_status(state.db(), &ListScope::for_user(&reviewer))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count achievements"))?;
    Ok(Json(StatusCountsResponse::from_counts(&counts)))
}

