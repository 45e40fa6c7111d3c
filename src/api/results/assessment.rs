use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::types::{TestResultStatus, TestSkill};
use crate::repositories;
use crate::schemas::assessment::{BulkAssessmentRequest, BulkAssessmentResponse};
use crate::services::grading::{self, BulkOutcome};

use super::session::fetch_owned_result;

/// Dispatch a batch of Writing/Speaking answers to the AI scorers. Scorer
/// failures are reported per part and leave the attempt InProgress, so the
/// client recovers by resubmitting; a fully scored batch grades the
/// attempt in one atomic claim.
pub(super) async fn submit_bulk_assessment(
    Path(test_result_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<BulkAssessmentRequest>,
) -> Result<Json<BulkAssessmentResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let test_result = fetch_owned_result(&state, &user, &test_result_id).await?;

    if test_result.status != TestResultStatus::InProgress {
        return Err(ApiError::Conflict("Test result has already been graded".to_string()));
    }

    let test = repositories::tests::find_by_id(state.db(), &test_result.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    if !matches!(
        test.skill,
        TestSkill::Writing | TestSkill::Speaking | TestSkill::FourSkills
    ) {
        return Err(ApiError::BadRequest(
            "This test has no Writing/Speaking parts to assess".to_string(),
        ));
    }

    let outcome = grading::submit_bulk_assessment(
        &state,
        &test_result,
        payload.duration_minutes,
        &payload.parts,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to run bulk assessment"))?;

    match outcome {
        BulkOutcome::Completed(response) => Ok(Json(response)),
        BulkOutcome::AlreadyGraded => {
            Err(ApiError::Conflict("Test result has already been graded".to_string()))
        }
    }
}
