use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{TestResultStatus, TestSkill};
use crate::repositories;
use crate::schemas::result::{GeneralLrResult, SubmitLrRequest};
use crate::services::grading;

use super::session::fetch_owned_result;

/// Grade a Listening/Reading attempt. Answers in the request body are
/// persisted first (covering the last page the client never auto-saved),
/// then grading runs over everything stored. Resubmitting a graded attempt
/// returns the stored result unchanged.
pub(super) async fn submit_lr_test(
    Path(test_result_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitLrRequest>,
) -> Result<Json<GeneralLrResult>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let test_result = fetch_owned_result(&state, &user, &test_result_id).await?;

    if test_result.test_id != payload.test_id {
        return Err(ApiError::BadRequest(
            "test_id does not match this test result".to_string(),
        ));
    }

    let test = repositories::tests::find_by_id(state.db(), &test_result.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    if !matches!(test.skill, TestSkill::Lr | TestSkill::FourSkills) {
        return Err(ApiError::BadRequest(
            "This test is not a Listening/Reading test".to_string(),
        ));
    }

    if test_result.status == TestResultStatus::InProgress {
        let now = primitive_now_utc();
        for answer in &payload.answers {
            let Some(label) =
                answer.chosen_label.as_deref().map(str::trim).filter(|label| !label.is_empty())
            else {
                continue;
            };
            repositories::user_answers::upsert(
                state.db(),
                repositories::user_answers::UpsertUserAnswer {
                    id: &Uuid::new_v4().to_string(),
                    test_result_id: &test_result.id,
                    test_question_id: &answer.test_question_id,
                    sub_question_index: answer.sub_question_index,
                    chosen_label: Some(label),
                    answer_text: None,
                    answer_audio_url: None,
                    now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to save answer"))?;
        }
    }

    let result = grading::submit_lr(&state, &test_result, payload.duration_minutes)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to grade test"))?;

    Ok(Json(result))
}
