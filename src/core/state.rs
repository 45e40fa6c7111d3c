use std::sync::Arc;

use sqlx::PgPool;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::ai_scoring::{SpeakingClient, WritingClient};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    redis: RedisHandle,
    writing_client: WritingClient,
    speaking_client: SpeakingClient,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        redis: RedisHandle,
        writing_client: WritingClient,
        speaking_client: SpeakingClient,
    ) -> Self {
        Self {
            inner: Arc::new(InnerState { settings, db, redis, writing_client, speaking_client }),
        }
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

    pub(crate) fn writing_client(&self) -> &WritingClient {
        &self.inner.writing_client
    }

    pub(crate) fn speaking_client(&self) -> &SpeakingClient {
        &self.inner.speaking_client
    }
}
