mod handlers;
mod helpers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/manual", post(handlers::create_manual))
        .route("/from-bank", post(handlers::create_from_bank))
        .route("/:test_id", get(handlers::get_test))
        .route("/:test_id/publish", post(handlers::publish_test))
        .route("/:test_id/archive", post(handlers::archive_test))
        .route("/:test_id/versions", post(handlers::create_version))
        .route(
            "/:test_id/questions/:test_question_id/refresh-snapshot",
            post(handlers::refresh_snapshot),
        )
}

#[cfg(test)]
mod tests;
