use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder, Transaction};
use time::{Date, PrimitiveDateTime};

use crate::db::models::Achievement;
use crate::db::types::{AchievementKind, AchievementStatus};
use crate::repositories::reviews::{self, CreateReview};
use crate::services::scope::ListScope;

pub(crate) const COLUMNS: &str = "\
    a.id, a.owner_id, a.title, a.description, a.content, a.kind, a.status, a.award_level, \
    a.achieved_on, a.tags, a.review_comment, a.reviewed_by, a.reviewed_at, a.submitted_at, \
    a.published_at, a.created_at, a.updated_at";

/// Achievement joined with its owner's display name.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AchievementRow {
    #[sqlx(flatten)]
    pub(crate) achievement: Achievement,
    pub(crate) owner_name: String,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct AchievementFilter {
    pub status: Option<AchievementStatus>,
    pub kind: Option<AchievementKind>,
    pub owner_id: Option<String>,
    pub search: Option<String>,
}

/// User-editable columns, written as a whole.
pub(crate) struct AchievementFields<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub content: &'a str,
    pub kind: AchievementKind,
    pub award_level: Option<&'a str>,
    pub achieved_on: Option<Date>,
    pub tags: &'a [String],
}

/// Column updates for one workflow transition, applied only if the row is still in `from`.
pub(crate) struct StatusChange<'a> {
    pub transition: &'a str,
    pub from: AchievementStatus,
    pub to: AchievementStatus,
    pub actor_id: &'a str,
    pub comment: Option<&'a str>,
    pub stamp_submitted: bool,
    pub record_review: bool,
    pub clear_comment: bool,
    pub now: PrimitiveDateTime,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Achievement>, sqlx::Error> {
    sqlx::query_as::<_, Achievement>(&format!("SELECT {COLUMNS} FROM achievements a WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Row-locks the achievement for the rest of the caller's transaction.
pub(crate) async fn lock_for_update(
    executor: impl PgExecutor<'_>,
    id: &str,
) -> Result<Option<Achievement>, sqlx::Error> {
    sqlx::query_as::<_, Achievement>(&format!(
        "SELECT {COLUMNS} FROM achievements a WHERE a.id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn find_row_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AchievementRow>, sqlx::Error> {
    sqlx::query_as::<_, AchievementRow>(&format!(
        "SELECT {COLUMNS}, u.full_name AS owner_name
         FROM achievements a
         JOIN users u ON u.id = a.owner_id
         WHERE a.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    owner_id: &str,
    fields: AchievementFields<'_>,
    now: PrimitiveDateTime,
) -> Result<Achievement, sqlx::Error> {
    sqlx::query_as::<_, Achievement>(&format!(
        "INSERT INTO achievements AS a (
            id, owner_id, title, description, content, kind, status, award_level, achieved_on,
            tags, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11)
        RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(owner_id)
    .bind(fields.title)
    .bind(fields.description)
    .bind(fields.content)
    .bind(fields.kind)
    .bind(AchievementStatus::Draft)
    .bind(fields.award_level)
    .bind(fields.achieved_on)
    .bind(Json(fields.tags))
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Saves edited fields, optionally moving the record back to draft in the same transaction.
/// Returns `None` when the row left `expected` in the meantime.
pub(crate) async fn apply_edit(
    pool: &PgPool,
    id: &str,
    expected: AchievementStatus,
    fields: AchievementFields<'_>,
    reopen: Option<StatusChange<'_>>,
    now: PrimitiveDateTime,
) -> Result<Option<Achievement>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let expected = match reopen {
        Some(change) => {
            if change_status(&mut tx, id, change).await?.is_none() {
                return Ok(None);
            }
            AchievementStatus::Draft
        }
        None => expected,
    };

    let updated = sqlx::query_as::<_, Achievement>(&format!(
        "UPDATE achievements AS a SET
            title = $1,
            description = $2,
            content = $3,
            kind = $4,
            award_level = $5,
            achieved_on = $6,
            tags = $7,
            updated_at = $8
         WHERE a.id = $9 AND a.status = $10
         RETURNING {COLUMNS}"
    ))
    .bind(fields.title)
    .bind(fields.description)
    .bind(fields.content)
    .bind(fields.kind)
    .bind(fields.award_level)
    .bind(fields.achieved_on)
    .bind(Json(fields.tags))
    .bind(now)
    .bind(id)
    .bind(expected)
    .fetch_optional(&mut *tx)
    .await?;

    if updated.is_some() {
        tx.commit().await?;
    }
    Ok(updated)
}

/// Compare-and-set status update plus its audit row. `None` means the status moved first.
pub(crate) async fn apply_transition(
    pool: &PgPool,
    id: &str,
    change: StatusChange<'_>,
) -> Result<Option<Achievement>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let updated = change_status(&mut tx, id, change).await?;
    if updated.is_some() {
        tx.commit().await?;
    }
    Ok(updated)
}

async fn change_status(
    tx: &mut Transaction<'_, Postgres>,
    id: &str,
    change: StatusChange<'_>,
) -> Result<Option<Achievement>, sqlx::Error> {
    let reviewer = change.record_review.then_some(change.actor_id);
    let updated = sqlx::query_as::<_, Achievement>(&format!(
        "UPDATE achievements AS a SET
            status = $1,
            submitted_at = CASE WHEN $2 THEN $3 ELSE a.submitted_at END,
            reviewed_by = CASE WHEN $4 THEN $5 ELSE a.reviewed_by END,
            reviewed_at = CASE WHEN $4 THEN $3 ELSE a.reviewed_at END,
            review_comment = CASE WHEN $4 THEN $6 WHEN $7 THEN NULL ELSE a.review_comment END,
            published_at = CASE WHEN $8 THEN $3 ELSE NULL END,
            updated_at = $3
         WHERE a.id = $9 AND a.status = $10
         RETURNING {COLUMNS}"
    ))
    .bind(change.to)
    .bind(change.stamp_submitted)
    .bind(change.now)
    .bind(change.record_review)
    .bind(reviewer)
    .bind(change.comment)
    .bind(change.clear_comment)
    .bind(change.to == AchievementStatus::Approved)
    .bind(id)
    .bind(change.from)
    .fetch_optional(&mut **tx)
    .await?;

    if updated.is_none() {
        return Ok(None);
    }

    reviews::insert(
        tx,
        CreateReview {
            achievement_id: id,
            actor_id: change.actor_id,
            transition: change.transition,
            from_status: change.from,
            to_status: change.to,
            comment: change.comment,
            created_at: change.now,
        },
    )
    .await?;

    Ok(updated)
}

fn push_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: &ListScope) {
    match scope {
        ListScope::Public => {
            builder.push(" AND a.status = ");
            builder.push_bind(AchievementStatus::Approved);
        }
        ListScope::OwnOrApproved { user_id } => {
            builder.push(" AND (a.owner_id = ");
            builder.push_bind(user_id.clone());
            builder.push(" OR a.status = ");
            builder.push_bind(AchievementStatus::Approved);
            builder.push(")");
        }
        ListScope::ExcludeOthersDrafts { user_id } => {
            builder.push(" AND (a.owner_id = ");
            builder.push_bind(user_id.clone());
            builder.push(" OR a.status <> ");
            builder.push_bind(AchievementStatus::Draft);
            builder.push(")");
        }
        ListScope::Everything => {}
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &AchievementFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND a.status = ");
        builder.push_bind(status);
    }
    if let Some(kind) = filter.kind {
        builder.push(" AND a.kind = ");
        builder.push_bind(kind);
    }
    if let Some(owner_id) = &filter.owner_id {
        builder.push(" AND a.owner_id = ");
        builder.push_bind(owner_id.clone());
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        builder.push(" AND a.title ILIKE ");
        builder.push_bind(format!("%{search}%"));
    }
}

pub(crate) async fn list(
    pool: &PgPool,
    scope: &ListScope,
    filter: &AchievementFilter,
    skip: i64,
    limit: i64,
) -> Result<Vec<AchievementRow>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS}, u.full_name AS owner_name
         FROM achievements a
         JOIN users u ON u.id = a.owner_id
         WHERE TRUE"
    ));
    push_scope(&mut builder, scope);
    push_filters(&mut builder, filter);
    builder.push(" ORDER BY a.updated_at DESC, a.id OFFSET ");
    builder.push_bind(skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(limit.clamp(1, 1000));

    builder.build_query_as::<AchievementRow>().fetch_all(pool).await
}

pub(crate) async fn count(
    pool: &PgPool,
    scope: &ListScope,
    filter: &AchievementFilter,
) -> Result<i64, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM achievements a WHERE TRUE");
    push_scope(&mut builder, scope);
    push_filters(&mut builder, filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

/// Pending records awaiting review, oldest submission first. The reviewer's own are skipped.
pub(crate) async fn review_queue(
    pool: &PgPool,
    reviewer_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<AchievementRow>, sqlx::Error> {
    sqlx::query_as::<_, AchievementRow>(&format!(
        "SELECT {COLUMNS}, u.full_name AS owner_name
         FROM achievements a
         JOIN users u ON u.id = a.owner_id
         WHERE a.status = $1 AND a.owner_id <> $2
         ORDER BY a.submitted_at ASC NULLS LAST, a.created_at ASC
         OFFSET $3 LIMIT $4"
    ))
    .bind(AchievementStatus::Pending)
    .bind(reviewer_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_review_queue(pool: &PgPool, reviewer_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM achievements WHERE status = $1 AND owner_id <> $2")
        .bind(AchievementStatus::Pending)
        .bind(reviewer_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn count_by_status(
    pool: &PgPool,
    scope: &ListScope,
) -> Result<Vec<(AchievementStatus, i64)>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new("SELECT a.status, COUNT(*) FROM achievements a WHERE TRUE");
    push_scope(&mut builder, scope);
    builder.push(" GROUP BY a.status");
    builder.build_query_as::<(AchievementStatus, i64)>().fetch_all(pool).await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM achievements WHERE id = $1").bind(id).execute(pool).await?;
    Ok(())
}
