use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{TestSkill, TestStatus, TestType};
use crate::repositories;
use crate::schemas::test::{
    test_to_detail, test_to_response, TestCreateFromBank, TestCreateManual, TestDetailResponse,
    TestResponse,
};
use crate::services::assembly::{self, PartContent};

use super::helpers;

pub(super) async fn create_manual(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<TestCreateManual>,
) -> Result<(StatusCode, Json<TestResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let parts = helpers::manual_parts_to_content(&payload.parts);
    assemble(
        &state,
        &admin.id,
        &payload.title,
        payload.description.as_deref(),
        payload.skill,
        payload.test_type,
        payload.duration_minutes,
        None,
        &parts,
    )
    .await
    .map(|response| (StatusCode::CREATED, Json(response)))
}

pub(super) async fn create_from_bank(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<TestCreateFromBank>,
) -> Result<(StatusCode, Json<TestResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let parts = helpers::bank_parts_to_content(state.db(), &payload.parts).await?;
    assemble(
        &state,
        &admin.id,
        &payload.title,
        payload.description.as_deref(),
        payload.skill,
        payload.test_type,
        payload.duration_minutes,
        None,
        &parts,
    )
    .await
    .map(|response| (StatusCode::CREATED, Json(response)))
}

/// Validate-then-persist: the structural gate runs before the transaction
/// opens, and test + questions commit together or not at all.
#[allow(clippy::too_many_arguments)]
async fn assemble(
    state: &AppState,
    created_by: &str,
    title: &str,
    description: Option<&str>,
    skill: TestSkill,
    test_type: TestType,
    duration_minutes: i32,
    parent_test_id: Option<&str>,
    parts: &[PartContent],
) -> Result<TestResponse, ApiError> {
    assembly::validate_test_structure(skill, parts)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let test = repositories::tests::create(
        &mut *tx,
        repositories::tests::CreateTest {
            id: &Uuid::new_v4().to_string(),
            title,
            description,
            skill,
            test_type,
            duration_minutes,
            status: TestStatus::Draft,
            parent_test_id,
            created_by,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create test"))?;

    helpers::insert_test_questions(&mut tx, &test, parts).await?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let question_count = parts
        .iter()
        .map(|part| {
            part.questions.len()
                + part.groups.iter().map(|group| group.questions.len()).sum::<usize>()
        })
        .sum();

    tracing::info!(test_id = %test.id, skill = ?skill, question_count, "Test assembled");

    Ok(test_to_response(test, question_count))
}

pub(super) async fn get_test(
    Path(test_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<TestDetailResponse>, ApiError> {
    let test = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let questions = repositories::tests::list_questions(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test questions"))?;

    Ok(Json(test_to_detail(test, &questions)))
}

pub(super) async fn publish_test(
    Path(test_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<TestResponse>, ApiError> {
    let test = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    if test.status != TestStatus::Draft {
        return Err(ApiError::Conflict("Only draft tests can be published".to_string()));
    }

    let published = repositories::tests::publish(state.db(), &test_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to publish test"))?;
    if !published {
        return Err(ApiError::Conflict("Only draft tests can be published".to_string()));
    }

    let test = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;
    let questions = repositories::tests::list_questions(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test questions"))?;
    let question_count =
        questions.iter().map(|question| question.snapshot.0.question_count()).sum();

    Ok(Json(test_to_response(test, question_count)))
}

pub(super) async fn archive_test(
    Path(test_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let test = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    if test.status != TestStatus::Published {
        return Err(ApiError::Conflict("Only published tests can be archived".to_string()));
    }

    let archived = repositories::tests::archive(state.db(), &test_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to archive test"))?;
    if !archived {
        return Err(ApiError::Conflict("Only published tests can be archived".to_string()));
    }

    Ok(Json(serde_json::json!({"message": "Test archived", "test_id": test_id})))
}

/// Published tests are immutable; changes land on a fresh draft clone
/// linked back through `parent_test_id`. Snapshots are copied as-is.
pub(super) async fn create_version(
    Path(test_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TestResponse>), ApiError> {
    let source = repositories::tests::find_by_id(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?
        .ok_or_else(|| ApiError::NotFound("Test not found".to_string()))?;

    let questions = repositories::tests::list_questions(state.db(), &test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test questions"))?;

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let clone = repositories::tests::create(
        &mut *tx,
        repositories::tests::CreateTest {
            id: &Uuid::new_v4().to_string(),
            title: &source.title,
            description: source.description.as_deref(),
            skill: source.skill,
            test_type: source.test_type,
            duration_minutes: source.duration_minutes,
            status: TestStatus::Draft,
            parent_test_id: Some(&source.id),
            created_by: &admin.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create test version"))?;

    for question in &questions {
        repositories::tests::create_question(
            &mut *tx,
            repositories::tests::CreateTestQuestion {
                id: &Uuid::new_v4().to_string(),
                test_id: &clone.id,
                part_id: question.part_id,
                order_in_test: question.order_in_test,
                source_question_id: question.source_question_id.as_deref(),
                source_group_id: question.source_group_id.as_deref(),
                snapshot: &question.snapshot.0,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to copy test question"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let question_count =
        questions.iter().map(|question| question.snapshot.0.question_count()).sum();

    Ok((StatusCode::CREATED, Json(test_to_response(clone, question_count))))
}

/// The explicit "update source from bank" action. This is the only path by
/// which a bank edit reaches an already-delivered snapshot.
pub(super) async fn refresh_snapshot(
    Path((test_id, test_question_id)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let question = repositories::tests::find_question_by_id(state.db(), &test_question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test question"))?
        .ok_or_else(|| ApiError::NotFound("Test question not found".to_string()))?;

    if question.test_id != test_id {
        return Err(ApiError::NotFound("Test question not found".to_string()));
    }

    let snapshot = if let Some(source_question_id) = question.source_question_id.as_deref() {
        let content =
            helpers::bank_question_content(state.db(), source_question_id, question.part_id)
                .await?;
        assembly::single_snapshot(&content)
    } else if let Some(source_group_id) = question.source_group_id.as_deref() {
        let content =
            helpers::bank_group_content(state.db(), source_group_id, question.part_id).await?;
        assembly::group_snapshot(&content)
    } else {
        return Err(ApiError::BadRequest(
            "This test question was entered manually and has no bank source".to_string(),
        ));
    };

    let updated =
        repositories::tests::update_question_snapshot(state.db(), &test_question_id, &snapshot)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update snapshot"))?;
    if !updated {
        return Err(ApiError::NotFound("Test question not found".to_string()));
    }

    tracing::info!(test_id = %test_id, test_question_id = %test_question_id, "Snapshot refreshed from bank");

    Ok(Json(serde_json::json!({
        "message": "Snapshot refreshed from bank",
        "test_question_id": test_question_id
    })))
}
