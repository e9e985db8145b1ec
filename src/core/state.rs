use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::storage::StorageService;

/// Handles shared by every request.
#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    storage: Option<StorageService>,
    started_at: Instant,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        storage: Option<StorageService>,
    ) -> Self {
        if storage.is_none() {
            tracing::warn!("Object storage is not configured; media endpoints will return 503");
        }
        let shared = Shared { settings, db, redis, storage, started_at: Instant::now() };
        Self { inner: Arc::new(shared) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }

    /// `None` when S3 credentials are absent.
    pub(crate) fn storage(&self) -> Option<&StorageService> {
        self.inner.storage.as_ref()
    }

    pub(crate) fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }
}
