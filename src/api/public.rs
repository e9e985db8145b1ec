use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::achievements::helpers;
use crate::api::errors::ApiError;
use crate::api::media::view_url_in_scope;
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::db::types::AchievementKind;
use crate::repositories::achievements::AchievementFilter;
use crate::schemas::achievement::{AchievementSummary, PublicAchievementResponse};
use crate::schemas::media::ViewUrlResponse;
use crate::services::scope::ListScope;

/// Anonymous showcase of approved achievements.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/achievements", get(list_public))
        .route("/achievements/:achievement_id", get(get_public))
        .route("/media/:media_id/view-url", get(public_view_url))
}

#[derive(Debug, Deserialize)]
struct PublicListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "crate::api::pagination::default_limit")]
    limit: i64,
    #[serde(default)]
    kind: Option<AchievementKind>,
    #[serde(default)]
    search: Option<String>,
}

async fn list_public(
    Query(params): Query<PublicListQuery>,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<AchievementSummary>>, ApiError> {
    let filter = AchievementFilter {
        status: None,
        kind: params.kind,
        owner_id: None,
        search: params.search,
    };
    helpers::list_in_scope(&state, &ListScope::Public, &filter, params.skip, params.limit)
        .await
        .map(Json)
}

async fn get_public(
    Path(achievement_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PublicAchievementResponse>, ApiError> {
    let row = helpers::load_in_scope(&state, &ListScope::Public, &achievement_id).await?;
    let media = helpers::media_for(&state, &row.achievement.id).await?;
    Ok(Json(PublicAchievementResponse::from_db(row.achievement, row.owner_name, media)))
}

async fn public_view_url(
    Path(media_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ViewUrlResponse>, ApiError> {
    view_url_in_scope(&state, &ListScope::Public, &media_id).await.map(Json)
}
