use sqlx::{PgExecutor, PgPool};

use crate::db::models::AchievementMedia;
use crate::db::types::MediaKind;

const COLUMNS: &str = "\
    id, achievement_id, filename, file_path, file_size, mime_type, media_kind, checksum, \
    order_index, uploaded_at";

pub(crate) async fn list_by_achievement(
    pool: &PgPool,
    achievement_id: &str,
) -> Result<Vec<AchievementMedia>, sqlx::Error> {
    sqlx::query_as::<_, AchievementMedia>(&format!(
        "SELECT {COLUMNS} FROM achievement_media
         WHERE achievement_id = $1
         ORDER BY order_index, uploaded_at"
    ))
    .bind(achievement_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AchievementMedia>, sqlx::Error> {
    sqlx::query_as::<_, AchievementMedia>(&format!(
        "SELECT {COLUMNS} FROM achievement_media WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count_by_achievement(
    pool: &PgPool,
    achievement_id: &str,
) -> Result<i64, sqlx::Error> {
    count_by_achievement_with_executor(pool, achievement_id).await
}

pub(crate) async fn count_by_achievement_with_executor(
    executor: impl PgExecutor<'_>,
    achievement_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM achievement_media WHERE achievement_id = $1")
        .bind(achievement_id)
        .fetch_one(executor)
        .await
}

pub(crate) async fn next_order_index_with_executor(
    executor: impl PgExecutor<'_>,
    achievement_id: &str,
) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(MAX(order_index) + 1, 0) FROM achievement_media WHERE achievement_id = $1",
    )
    .bind(achievement_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_paths_by_achievement(
    pool: &PgPool,
    achievement_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT file_path FROM achievement_media WHERE achievement_id = $1")
        .bind(achievement_id)
        .fetch_all(pool)
        .await
}

pub(crate) struct CreateMedia<'a> {
    pub id: &'a str,
    pub achievement_id: &'a str,
    pub filename: &'a str,
    pub file_path: &'a str,
    pub file_size: i64,
    pub mime_type: &'a str,
    pub media_kind: MediaKind,
    pub checksum: Option<&'a str>,
    pub order_index: i32,
    pub uploaded_at: time::PrimitiveDateTime,
}

pub(crate) async fn create_with_executor(
    executor: impl PgExecutor<'_>,
    params: CreateMedia<'_>,
) -> Result<AchievementMedia, sqlx::Error> {
    sqlx::query_as::<_, AchievementMedia>(&format!(
        "INSERT INTO achievement_media (
            id, achievement_id, filename, file_path, file_size, mime_type, media_kind,
            checksum, order_index, uploaded_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
        RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.achievement_id)
    .bind(params.filename)
    .bind(params.file_path)
    .bind(params.file_size)
    .bind(params.mime_type)
    .bind(params.media_kind)
    .bind(params.checksum)
    .bind(params.order_index)
    .bind(params.uploaded_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn exists_by_path(pool: &PgPool, file_path: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM achievement_media WHERE file_path = $1)")
        .bind(file_path)
        .fetch_one(pool)
        .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM achievement_media WHERE id = $1").bind(id).execute(pool).await?;
    Ok(())
}
