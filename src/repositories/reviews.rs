use sqlx::{PgPool, Postgres, Transaction};

use crate::db::models::AchievementReview;
use crate::db::types::AchievementStatus;

const COLUMNS: &str =
    "id, achievement_id, actor_id, transition, from_status, to_status, comment, created_at";

/// Audit row joined with the actor's display name.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReviewRow {
    #[sqlx(flatten)]
    pub(crate) review: AchievementReview,
    pub(crate) actor_name: String,
}

pub(crate) struct CreateReview<'a> {
    pub achievement_id: &'a str,
    pub actor_id: &'a str,
    pub transition: &'a str,
    pub from_status: AchievementStatus,
    pub to_status: AchievementStatus,
    pub comment: Option<&'a str>,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    params: CreateReview<'_>,
) -> Result<AchievementReview, sqlx::Error> {
    sqlx::query_as::<_, AchievementReview>(&format!(
        "INSERT INTO achievement_reviews (
            id, achievement_id, actor_id, transition, from_status, to_status, comment, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}"
    ))
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(params.achievement_id)
    .bind(params.actor_id)
    .bind(params.transition)
    .bind(params.from_status)
    .bind(params.to_status)
    .bind(params.comment)
    .bind(params.created_at)
    .fetch_one(&mut **tx)
    .await
}

pub(crate) async fn list_by_achievement(
    pool: &PgPool,
    achievement_id: &str,
) -> Result<Vec<ReviewRow>, sqlx::Error> {
    sqlx::query_as::<_, ReviewRow>(
        "SELECT r.id, r.achievement_id, r.actor_id, r.transition, r.from_status, r.to_status,
                r.comment, r.created_at, u.full_name AS actor_name
         FROM achievement_reviews r
         JOIN users u ON u.id = r.actor_id
         WHERE r.achievement_id = $1
         ORDER BY r.created_at, r.id",
    )
    .bind(achievement_id)
    .fetch_all(pool)
    .await
}
