use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::part_skill;
use crate::repositories;
use crate::schemas::question::{
    group_to_response, question_to_response, GroupCreate, GroupResponse, QuestionCreate,
    QuestionResponse, QuestionUpdate,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_question))
        .route("/:question_id", get(get_question).patch(update_question))
}

pub(crate) fn groups_router() -> Router<AppState> {
    Router::new().route("/", post(create_group)).route("/:group_id", get(get_group))
}

async fn create_question(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if part_skill(payload.part_id).is_none() {
        return Err(ApiError::BadRequest(format!("part {} does not exist", payload.part_id)));
    }

    if let Some(group_id) = payload.group_id.as_deref() {
        let group = repositories::questions::find_group_by_id(state.db(), group_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch question group"))?;
        if group.is_none() {
            return Err(ApiError::NotFound("Question group not found".to_string()));
        }
    }

    let now = primitive_now_utc();
    let question_id = Uuid::new_v4().to_string();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let question = repositories::questions::create(
        &mut *tx,
        repositories::questions::CreateQuestion {
            id: &question_id,
            part_id: payload.part_id,
            group_id: payload.group_id.as_deref(),
            content: payload.content.as_deref(),
            image_url: payload.image_url.as_deref(),
            audio_url: payload.audio_url.as_deref(),
            explanation: payload.explanation.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    for option in &payload.options {
        repositories::questions::create_option(
            &mut *tx,
            repositories::questions::CreateOption {
                id: &Uuid::new_v4().to_string(),
                question_id: &question_id,
                label: &option.label,
                content: &option.content,
                is_correct: option.is_correct,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create option"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let options = repositories::questions::list_options(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;

    Ok((StatusCode::CREATED, Json(question_to_response(question, options))))
}

async fn get_question(
    Path(question_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    let options = repositories::questions::list_options(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;

    Ok(Json(question_to_response(question, options)))
}

/// Edits the live bank row. Snapshots taken by existing tests are not
/// touched; only the explicit refresh-snapshot action propagates this.
async fn update_question(
    Path(question_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let now = primitive_now_utc();

    let question = repositories::questions::update(
        state.db(),
        &question_id,
        repositories::questions::UpdateQuestion {
            content: payload.content.as_deref(),
            image_url: payload.image_url.as_deref(),
            audio_url: payload.audio_url.as_deref(),
            explanation: payload.explanation.as_deref(),
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    if let Some(options) = &payload.options {
        let mut tx = state
            .db()
            .begin()
            .await
            .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

        repositories::questions::delete_options(&mut *tx, &question_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to clear options"))?;

        for option in options {
            repositories::questions::create_option(
                &mut *tx,
                repositories::questions::CreateOption {
                    id: &Uuid::new_v4().to_string(),
                    question_id: &question_id,
                    label: &option.label,
                    content: &option.content,
                    is_correct: option.is_correct,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create option"))?;
        }

        tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;
    }

    let options = repositories::questions::list_options(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;

    Ok(Json(question_to_response(question, options)))
}

async fn create_group(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<GroupCreate>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if part_skill(payload.part_id).is_none() {
        return Err(ApiError::BadRequest(format!("part {} does not exist", payload.part_id)));
    }

    let now = primitive_now_utc();
    let group = repositories::questions::create_group(
        state.db(),
        repositories::questions::CreateGroup {
            id: &Uuid::new_v4().to_string(),
            part_id: payload.part_id,
            passage: payload.passage.as_deref(),
            image_url: payload.image_url.as_deref(),
            audio_url: payload.audio_url.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question group"))?;

    Ok((StatusCode::CREATED, Json(group_to_response(group))))
}

async fn get_group(
    Path(group_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = repositories::questions::find_group_by_id(state.db(), &group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question group"))?
        .ok_or_else(|| ApiError::NotFound("Question group not found".to_string()))?;

    Ok(Json(group_to_response(group)))
}
