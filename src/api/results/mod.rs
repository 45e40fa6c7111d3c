mod assessment;
mod session;
mod submit;

use axum::{routing::get, routing::post, routing::put, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(session::start_test))
        .route("/:test_result_id", get(session::get_result))
        .route("/:test_result_id/answers", put(session::save_answer))
        .route("/:test_result_id/submit-lr", post(submit::submit_lr_test))
        .route("/:test_result_id/bulk-assessment", post(assessment::submit_bulk_assessment))
}
