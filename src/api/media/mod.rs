mod handlers;

use axum::{routing::get, Router};

use crate::core::state::AppState;

pub(crate) use handlers::{
    confirm_upload, delete_media, list_media, presigned_upload_url, upload_media, view_url_in_scope,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:media_id/view-url", get(handlers::view_url))
}
