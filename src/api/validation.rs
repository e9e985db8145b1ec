use std::path::Path;

use crate::api::errors::ApiError;
use crate::db::types::MediaKind;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;
pub(crate) const MAX_FILENAME_LEN: usize = 120;

pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    let valid = (3..=64).contains(&len)
        && username.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(
            "Username must be 3-64 characters of letters, digits, '.', '_' or '-'".to_string(),
        ))
    }
}

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

pub(crate) fn validate_full_name(full_name: &str) -> Result<(), ApiError> {
    let len = full_name.trim().chars().count();
    if (1..=200).contains(&len) {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Full name must be 1-200 characters".to_string()))
    }
}

/// Checks the extension against the allow-list and the declared MIME against the extension.
/// Returns the media kind the file will be stored as.
pub(crate) fn validate_media_upload(
    filename: &str,
    content_type: &str,
    allowed_extensions: &[String],
) -> Result<MediaKind, ApiError> {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .ok_or_else(|| ApiError::BadRequest("File must have an extension".to_string()))?;

    if !allowed_extensions.iter().any(|allowed| allowed == &extension) {
        return Err(ApiError::BadRequest(format!("File extension '{extension}' is not allowed")));
    }

    let mime = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    media_kind_for(&mime, &extension).ok_or_else(|| {
        ApiError::BadRequest(format!("MIME type '{mime}' does not match extension '.{extension}'"))
    })
}

fn media_kind_for(mime: &str, extension: &str) -> Option<MediaKind> {
    let matches = match extension {
        "jpg" | "jpeg" => matches!(mime, "image/jpeg" | "image/jpg"),
        "png" => mime == "image/png",
        "webp" => mime == "image/webp",
        "gif" => mime == "image/gif",
        "mp4" => mime == "video/mp4",
        "webm" => mime == "video/webm",
        "mov" => mime == "video/quicktime",
        "pdf" => mime == "application/pdf",
        _ => false,
    };
    if !matches {
        return None;
    }

    match mime.split('/').next() {
        Some("image") => Some(MediaKind::Image),
        Some("video") => Some(MediaKind::Video),
        _ => Some(MediaKind::Document),
    }
}

/// Keeps `[A-Za-z0-9._-]`, replaces everything else with `_`, and trims to the length limit
/// while preserving the extension.
pub(crate) fn sanitized_filename(filename: &str) -> String {
    let base = Path::new(filename).file_name().and_then(|name| name.to_str()).unwrap_or("file");
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    let cleaned = if cleaned.is_empty() { "file" } else { cleaned };

    if cleaned.len() <= MAX_FILENAME_LEN {
        return cleaned.to_string();
    }

    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if ext.len() < 16 => {
            let keep = MAX_FILENAME_LEN - ext.len() - 1;
            format!("{}.{ext}", &stem[..keep.min(stem.len())])
        }
        _ => cleaned[..MAX_FILENAME_LEN].to_string(),
    }
}
