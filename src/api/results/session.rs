use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{TestResult, User};
use crate::db::types::{is_lr_part, TestResultStatus, TestStatus, UserRole};
use crate::repositories;
use crate::schemas::result::{
    result_to_detail, SaveAnswerRequest, SaveAnswerResponse, StartTestRequest, StartTestResponse,
    TestResultDetail,
};
use crate::schemas::test::test_to_detail;

pub(super) async fn start_test(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<StartTestRequest>,
) -> Result<(StatusCode, Json<StartTestResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let test = repositories::tests::find_by_id(state.db(), &payload.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    if test.status != TestStatus::Published {
        return Err(ApiError::BadRequest("Test is not available".to_string()));
    }

    let questions = repositories::tests::list_questions(state.db(), &test.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test questions"))?;

    let now = primitive_now_utc();
    let test_result = repositories::test_results::create(
        state.db(),
        repositories::test_results::CreateTestResult {
            id: &Uuid::new_v4().to_string(),
            user_id: &user.id,
            test_id: &test.id,
            status: TestResultStatus::InProgress,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create test result"))?;

    tracing::info!(
        test_result_id = %test_result.id,
        test_id = %test.id,
        user_id = %user.id,
        "Test session started"
    );

    Ok((
        StatusCode::CREATED,
        Json(StartTestResponse {
            test_result_id: test_result.id,
            status: test_result.status,
            started_at: format_primitive(test_result.created_at),
            test: test_to_detail(test, &questions),
        }),
    ))
}

pub(super) async fn save_answer(
    Path(test_result_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SaveAnswerRequest>,
) -> Result<Json<SaveAnswerResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let test_result = fetch_owned_result(&state, &user, &test_result_id).await?;

    if test_result.status != TestResultStatus::InProgress {
        return Err(ApiError::Conflict("Test result has already been graded".to_string()));
    }

    let question =
        repositories::tests::find_question_by_id(state.db(), &payload.test_question_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch test question"))?
            .ok_or_else(|| ApiError::NotFound("Test question not found".to_string()))?;

    if question.test_id != test_result.test_id {
        return Err(ApiError::BadRequest(
            "Test question does not belong to this test".to_string(),
        ));
    }
    if !is_lr_part(question.part_id) {
        return Err(ApiError::BadRequest(
            "Only Listening/Reading answers are saved per question".to_string(),
        ));
    }
    let unit_count = question.snapshot.0.question_count() as i32;
    if payload.sub_question_index < 0 || payload.sub_question_index >= unit_count {
        return Err(ApiError::BadRequest("sub_question_index is out of range".to_string()));
    }

    let configured_interval = state.settings().session().answer_save_interval_seconds.max(1);
    let rate_key = format!("answersave:{test_result_id}");
    let allowed = match state.redis().rate_limit(&rate_key, 5, configured_interval).await {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(error = %err, "Failed to check answer-save rate limit");
            true
        }
    };
    if !allowed {
        return Err(ApiError::TooManyRequests("Answer-save rate limit exceeded"));
    }

    let now = primitive_now_utc();
    repositories::user_answers::upsert(
        state.db(),
        repositories::user_answers::UpsertUserAnswer {
            id: &Uuid::new_v4().to_string(),
            test_result_id: &test_result.id,
            test_question_id: &payload.test_question_id,
            sub_question_index: payload.sub_question_index,
            chosen_label: Some(&payload.chosen_label),
            answer_text: None,
            answer_audio_url: None,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save answer"))?;

    Ok(Json(SaveAnswerResponse { success: true, saved_at: format_primitive(now) }))
}

pub(super) async fn get_result(
    Path(test_result_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<TestResultDetail>, ApiError> {
    let test_result = fetch_owned_result(&state, &user, &test_result_id).await?;

    let skill_scores = repositories::skill_scores::list_by_result(state.db(), &test_result.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch skill scores"))?;
    let feedbacks = repositories::ai_feedback::list_latest_by_result(state.db(), &test_result.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch feedback"))?;

    Ok(Json(result_to_detail(test_result, skill_scores, feedbacks)))
}

pub(super) async fn fetch_owned_result(
    state: &AppState,
    user: &User,
    test_result_id: &str,
) -> Result<TestResult, ApiError> {
    let test_result = repositories::test_results::find_by_id(state.db(), test_result_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test result"))?
        .ok_or_else(|| ApiError::NotFound("Test result not found".to_string()))?;

    if test_result.user_id != user.id && user.role != UserRole::Admin {
        return Err(ApiError::Forbidden("Access denied"));
    }

    Ok(test_result)
}
