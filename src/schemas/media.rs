use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::AchievementMedia;
use crate::db::types::MediaKind;

#[derive(Debug, Serialize)]
pub(crate) struct MediaResponse {
    pub(crate) id: String,
    pub(crate) achievement_id: String,
    pub(crate) filename: String,
    pub(crate) file_size: i64,
    pub(crate) mime_type: String,
    pub(crate) media_kind: MediaKind,
    pub(crate) checksum: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) uploaded_at: String,
}

impl MediaResponse {
    pub(crate) fn from_db(media: AchievementMedia) -> Self {
        Self {
            id: media.id,
            achievement_id: media.achievement_id,
            filename: media.filename,
            file_size: media.file_size,
            mime_type: media.mime_type,
            media_kind: media.media_kind,
            checksum: media.checksum,
            order_index: media.order_index,
            uploaded_at: format_primitive(media.uploaded_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PresignedUploadQuery {
    pub(crate) filename: String,
    #[serde(alias = "contentType")]
    pub(crate) content_type: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct PresignedUploadResponse {
    pub(crate) upload_url: String,
    pub(crate) s3_key: String,
    pub(crate) method: String,
    pub(crate) headers: HashMap<String, String>,
    pub(crate) expires_in: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MediaConfirmRequest {
    #[serde(alias = "s3Key")]
    #[validate(length(min = 1, max = 512, message = "s3_key must be 1-512 characters"))]
    pub(crate) s3_key: String,
    #[validate(length(min = 1, max = 255, message = "filename must be 1-255 characters"))]
    pub(crate) filename: String,
    #[serde(alias = "contentType")]
    pub(crate) content_type: String,
    #[serde(alias = "fileSize")]
    #[validate(range(min = 1, message = "file_size must be positive"))]
    pub(crate) file_size: i64,
    #[serde(default)]
    #[serde(alias = "orderIndex")]
    #[validate(range(min = 0, message = "order_index must be non-negative"))]
    pub(crate) order_index: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ViewUrlResponse {
    pub(crate) url: String,
    pub(crate) expires_in: u64,
}
