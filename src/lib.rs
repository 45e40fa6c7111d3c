pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use tokio::sync::watch;

use crate::core::{config::Settings, redis::RedisHandle, state::AppState, telemetry};
use crate::services::ai_scoring::{SpeakingClient, WritingClient};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let redis = RedisHandle::new(settings.redis().redis_url());
    if let Err(err) = redis.connect().await {
        tracing::error!(error = %err, "Failed to connect to Redis; continuing without rate limits");
    } else {
        tracing::info!("Redis connected successfully");
    }

    let writing_client = WritingClient::from_settings(&settings)?;
    let speaking_client = SpeakingClient::from_settings(&settings)?;
    let state = AppState::new(settings, db_pool, redis.clone(), writing_client, speaking_client);

    if let Err(err) = core::bootstrap::ensure_admin_user(&state).await {
        tracing::error!(error = %err, "Failed to ensure default admin user");
    }

    // The expiry reaper runs in-process alongside the request handlers and
    // is stopped through the same shutdown signal.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reaper = tokio::spawn(tasks::scheduler::run(state.clone(), shutdown_rx));

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        "ToeicGenius Rust API listening"
    );

    let result =
        axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await;

    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to the reaper");
    }
    if let Err(err) = reaper.await {
        tracing::error!(error = %err, "Reaper task join failed");
    }

    redis.disconnect().await;
    tracing::info!("Redis disconnected");

    result?;

    Ok(())
}
