use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::achievements::helpers;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::{sanitized_filename, validate_media_upload};
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Achievement, AchievementMedia, User};
use crate::db::types::MediaKind;
use crate::repositories;
use crate::repositories::media::CreateMedia;
use crate::schemas::media::{
    MediaConfirmRequest, MediaResponse, PresignedUploadQuery, PresignedUploadResponse,
    ViewUrlResponse,
};
use crate::services::scope::ListScope;
use crate::services::storage::{achievement_prefix, media_key, StorageService};
use crate::services::workflow;

const STORAGE_DISABLED: &str = "Object storage is not configured";

pub(crate) async fn list_media(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<MediaResponse>>, ApiError> {
    helpers::load_visible(&state, &user, &achievement_id).await?;
    helpers::media_for(&state, &achievement_id).await.map(Json)
}

pub(crate) async fn upload_media(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MediaResponse>), ApiError> {
    let achievement = load_manageable(&state, &user, &achievement_id).await?;
    let storage = require_storage(&state)?;
    ensure_capacity(&state, &achievement.id).await?;

    let storage_settings = state.settings().storage();
    let max_bytes = storage_settings.max_upload_bytes();

    let mut file_bytes: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut order_index: Option<i32> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().map(str::to_string);
                content_type = field.content_type().map(str::to_string);
                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
                {
                    if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                        return Err(ApiError::PayloadTooLarge(format!(
                            "File size exceeds {}MB limit",
                            storage_settings.max_upload_size_mb
                        )));
                    }
                    bytes.extend_from_slice(&chunk);
                }
                file_bytes = Some(bytes);
            }
            "order_index" => {
                let text = field
                    .text()
                    .await
                    .map_err(|_| ApiError::BadRequest("Invalid order index".to_string()))?;
                order_index = Some(parse_order_index(&text)?);
            }
            _ => {}
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| ApiError::BadRequest("File is required".to_string()))?;
    if file_bytes.is_empty() {
        return Err(ApiError::BadRequest("File is empty".to_string()));
    }
    let filename = filename.unwrap_or_else(|| "upload".to_string());
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
    let media_kind =
        validate_media_upload(&filename, &content_type, &storage_settings.allowed_media_extensions)?;

    let stored_name = sanitized_filename(&filename);
    let key = media_key(&achievement.id, &stored_name);
    let stored = storage
        .upload_bytes(&key, &content_type, file_bytes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to upload file to object storage"))?;

    let registered = register_media(
        &state,
        &user,
        NewMedia {
            achievement_id: &achievement.id,
            filename: &stored_name,
            file_path: &key,
            file_size: stored.size,
            mime_type: &content_type,
            media_kind,
            checksum: Some(&stored.checksum),
            order_index,
        },
    )
    .await;
    let media = match registered {
        Ok(media) => media,
        Err(err) => {
            storage.delete_objects_best_effort([key]).await;
            return Err(err);
        }
    };

    metrics::record_media_upload(media_kind.as_str(), stored.size);
    tracing::info!(
        achievement_id = %achievement.id,
        actor_id = %user.id,
        media_id = %media.id,
        bytes = stored.size,
        action = "media_upload",
        "Media uploaded"
    );

    Ok((StatusCode::CREATED, Json(MediaResponse::from_db(media))))
}

pub(crate) async fn presigned_upload_url(
    Path(achievement_id): Path<String>,
    Query(query): Query<PresignedUploadQuery>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<PresignedUploadResponse>, ApiError> {
    let achievement = load_manageable(&state, &user, &achievement_id).await?;
    validate_media_upload(
        &query.filename,
        &query.content_type,
        &state.settings().storage().allowed_media_extensions,
    )?;
    let storage = require_storage(&state)?;
    ensure_capacity(&state, &achievement.id).await?;

    let key = media_key(&achievement.id, &sanitized_filename(&query.filename));
    let upload_url = storage
        .presign_put(&key, &query.content_type)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to generate upload URL"))?;

    let headers = HashMap::from([("Content-Type".to_string(), query.content_type)]);
    Ok(Json(PresignedUploadResponse {
        upload_url,
        s3_key: key,
        method: "PUT".to_string(),
        headers,
        expires_in: storage.url_ttl().as_secs(),
    }))
}

pub(crate) async fn confirm_upload(
    Path(achievement_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<MediaConfirmRequest>,
) -> Result<(StatusCode, Json<MediaResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let achievement = load_manageable(&state, &user, &achievement_id).await?;
    if !payload.s3_key.starts_with(&achievement_prefix(&achievement.id))
        || payload.s3_key.contains("..")
    {
        return Err(ApiError::BadRequest("Object key does not belong to this achievement".to_string()));
    }

    let storage_settings = state.settings().storage();
    let media_kind = validate_media_upload(
        &payload.filename,
        &payload.content_type,
        &storage_settings.allowed_media_extensions,
    )?;
    let storage = require_storage(&state)?;
    ensure_capacity(&state, &achievement.id).await?;

    let already_registered = repositories::media::exists_by_path(state.db(), &payload.s3_key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check media"))?;
    if already_registered {
        return Err(ApiError::Conflict("This upload is already registered".to_string()));
    }

    let file_size = storage
        .object_size(&payload.s3_key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to inspect uploaded object"))?
        .ok_or_else(|| ApiError::BadRequest("Uploaded object not found".to_string()))?;
    if file_size as u64 > storage_settings.max_upload_bytes() {
        storage.delete_objects_best_effort([payload.s3_key.clone()]).await;
        return Err(ApiError::PayloadTooLarge(format!(
            "File size exceeds {}MB limit",
            storage_settings.max_upload_size_mb
        )));
    }
    if file_size != payload.file_size {
        tracing::warn!(
            declared = payload.file_size,
            actual = file_size,
            key = %payload.s3_key,
            "Declared upload size differs from stored object"
        );
    }

    let media = register_media(
        &state,
        &user,
        NewMedia {
            achievement_id: &achievement.id,
            filename: &sanitized_filename(&payload.filename),
            file_path: &payload.s3_key,
            file_size,
            mime_type: &payload.content_type,
            media_kind,
            checksum: None,
            order_index: payload.order_index,
        },
    )
    .await?;

    metrics::record_media_upload(media_kind.as_str(), file_size);
    tracing::info!(
        achievement_id = %achievement.id,
        actor_id = %user.id,
        media_id = %media.id,
        action = "media_confirm",
        "Direct upload registered"
    );

    Ok((StatusCode::CREATED, Json(MediaResponse::from_db(media))))
}

pub(crate) async fn delete_media(
    Path((achievement_id, media_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let achievement = load_manageable(&state, &user, &achievement_id).await?;

    let media = repositories::media::find_by_id(state.db(), &media_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch media"))?
        .filter(|media| media.achievement_id == achievement.id)
        .ok_or_else(|| ApiError::NotFound("Media not found".to_string()))?;

    repositories::media::delete_by_id(state.db(), &media.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete media"))?;

    if let Some(storage) = state.storage() {
        storage.delete_objects_best_effort([media.file_path]).await;
    }

    tracing::info!(
        achievement_id = %achievement.id,
        actor_id = %user.id,
        media_id = %media.id,
        action = "media_delete",
        "Media deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn view_url(
    Path(media_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ViewUrlResponse>, ApiError> {
    view_url_in_scope(&state, &ListScope::for_user(&user), &media_id).await.map(Json)
}

/// Presigned GET for a media object whose achievement is visible in `scope`.
pub(crate) async fn view_url_in_scope(
    state: &AppState,
    scope: &ListScope,
    media_id: &str,
) -> Result<ViewUrlResponse, ApiError> {
    let media = repositories::media::find_by_id(state.db(), media_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch media"))?
        .ok_or_else(|| ApiError::NotFound("Media not found".to_string()))?;

    match helpers::load_in_scope(state, scope, &media.achievement_id).await {
        Ok(_) => {}
        Err(ApiError::NotFound(_)) => {
            return Err(ApiError::NotFound("Media not found".to_string()));
        }
        Err(err) => return Err(err),
    }

    let storage = require_storage(state)?;
    let url = storage
        .presign_get(&media.file_path)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to generate view URL"))?;

    Ok(ViewUrlResponse { url, expires_in: storage.url_ttl().as_secs() })
}

async fn load_manageable(
    state: &AppState,
    user: &User,
    achievement_id: &str,
) -> Result<Achievement, ApiError> {
    let row = helpers::load_visible(state, user, achievement_id).await?;
    workflow::ensure_can_manage_media(&row.achievement, user)?;
    Ok(row.achievement)
}

fn require_storage(state: &AppState) -> Result<&StorageService, ApiError> {
    state.storage().ok_or_else(|| ApiError::ServiceUnavailable(STORAGE_DISABLED.to_string()))
}

async fn ensure_capacity(state: &AppState, achievement_id: &str) -> Result<(), ApiError> {
    let current = repositories::media::count_by_achievement(state.db(), achievement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count achievement media"))?;

    let max_media = state.settings().storage().max_media_per_achievement as i64;
    if current >= max_media {
        return Err(ApiError::BadRequest(format!(
            "Maximum number of media files per achievement exceeded ({max_media})"
        )));
    }
    Ok(())
}

pub(super) struct NewMedia<'a> {
    pub(super) achievement_id: &'a str,
    pub(super) filename: &'a str,
    pub(super) file_path: &'a str,
    pub(super) file_size: i64,
    pub(super) mime_type: &'a str,
    pub(super) media_kind: MediaKind,
    pub(super) checksum: Option<&'a str>,
    pub(super) order_index: Option<i32>,
}

/// Inserts the media row under a lock on its achievement, so the edit rights,
/// capacity and order index seen here still hold at commit.
pub(super) async fn register_media(
    state: &AppState,
    user: &User,
    new: NewMedia<'_>,
) -> Result<AchievementMedia, ApiError> {
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start media transaction"))?;

    let db_insert = async {
        let achievement = repositories::achievements::lock_for_update(&mut *tx, new.achievement_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to lock achievement"))?
            .ok_or_else(ApiError::achievement_not_found)?;
        workflow::ensure_can_manage_media(&achievement, user)?;

        let current =
            repositories::media::count_by_achievement_with_executor(&mut *tx, &achievement.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to count achievement media"))?;
        let max_media = state.settings().storage().max_media_per_achievement as i64;
        if current >= max_media {
            return Err(ApiError::BadRequest(format!(
                "Maximum number of media files per achievement exceeded ({max_media})"
            )));
        }

        let order_index = match new.order_index {
            Some(value) => value,
            None => repositories::media::next_order_index_with_executor(&mut *tx, &achievement.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to compute media order"))?,
        };

        repositories::media::create_with_executor(
            &mut *tx,
            CreateMedia {
                id: &Uuid::new_v4().to_string(),
                achievement_id: &achievement.id,
                filename: new.filename,
                file_path: new.file_path,
                file_size: new.file_size,
                mime_type: new.mime_type,
                media_kind: new.media_kind,
                checksum: new.checksum,
                order_index,
                uploaded_at: primitive_now_utc(),
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store media metadata"))
    }
    .await;

    match db_insert {
        Ok(media) => {
            tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit media"))?;
            Ok(media)
        }
        Err(err) => {
            let _ = tx.rollback().await;
            Err(err)
        }
    }
}

fn parse_order_index(text: &str) -> Result<i32, ApiError> {
    text.trim()
        .parse::<i32>()
        .ok()
        .filter(|value| *value >= 0)
        .ok_or_else(|| ApiError::BadRequest("order_index must be a non-negative integer".to_string()))
}
