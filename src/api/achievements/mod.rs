mod handlers;
pub(crate) mod helpers;
mod queries;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;

use crate::api::media;
use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_achievement).get(handlers::list_achievements))
        .route("/mine", get(handlers::list_mine))
        .route("/review-queue", get(handlers::review_queue))
        .route("/stats", get(handlers::stats))
        .route(
            "/:achievement_id",
            get(handlers::get_achievement)
                .patch(handlers::update_achievement)
                .delete(handlers::delete_achievement),
        )
        .route("/:achievement_id/history", get(handlers::history))
        .route("/:achievement_id/submit", post(handlers::submit))
        .route("/:achievement_id/withdraw", post(handlers::withdraw))
        .route("/:achievement_id/approve", post(handlers::approve))
        .route("/:achievement_id/reject", post(handlers::reject))
        .route("/:achievement_id/reopen", post(handlers::reopen))
        .route("/:achievement_id/revoke", post(handlers::revoke))
        .route(
            "/:achievement_id/media",
            get(media::list_media)
                .post(media::upload_media)
                .layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/:achievement_id/media/presigned-upload-url",
            post(media::presigned_upload_url),
        )
        .route("/:achievement_id/media/confirm", post(media::confirm_upload))
        .route("/:achievement_id/media/:media_id", delete(media::delete_media))
}

#[cfg(test)]
mod tests;
