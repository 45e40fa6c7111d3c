use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::db::models::Test;
use crate::db::snapshot::TestQuestionSnapshot;
use crate::repositories;
use crate::schemas::test::{BankPartPayload, ManualGroupPayload, ManualPartPayload, ManualQuestionPayload};
use crate::services::assembly::{
    self, GroupContent, OptionContent, PartContent, QuestionContent,
};

pub(super) fn manual_question_to_content(question: &ManualQuestionPayload) -> QuestionContent {
    QuestionContent {
        content: question.content.clone(),
        image_url: question.image_url.clone(),
        audio_url: question.audio_url.clone(),
        explanation: question.explanation.clone(),
        options: question
            .options
            .iter()
            .map(|option| OptionContent {
                label: option.label.clone(),
                content: option.content.clone(),
                is_correct: option.is_correct,
            })
            .collect(),
        source_question_id: None,
    }
}

fn manual_group_to_content(group: &ManualGroupPayload) -> GroupContent {
    GroupContent {
        passage: group.passage.clone(),
        image_url: group.image_url.clone(),
        audio_url: group.audio_url.clone(),
        questions: group.questions.iter().map(manual_question_to_content).collect(),
        source_group_id: None,
    }
}

pub(super) fn manual_parts_to_content(parts: &[ManualPartPayload]) -> Vec<PartContent> {
    parts
        .iter()
        .map(|part| PartContent {
            part_id: part.part_id,
            questions: part.questions.iter().map(manual_question_to_content).collect(),
            groups: part.groups.iter().map(manual_group_to_content).collect(),
        })
        .collect()
}

/// Resolve a bank question (with options) into assembly content, checking
/// it actually belongs to the requested part.
pub(super) async fn bank_question_content(
    pool: &PgPool,
    question_id: &str,
    expected_part_id: i32,
) -> Result<QuestionContent, ApiError> {
    let question = repositories::questions::find_by_id(pool, question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch bank question"))?
        .ok_or_else(|| ApiError::NotFound(format!("Question {question_id} not found")))?;

    if question.part_id != expected_part_id {
        return Err(ApiError::BadRequest(format!(
            "question {question_id} belongs to part {}, not part {expected_part_id}",
            question.part_id
        )));
    }

    let options = repositories::questions::list_options(pool, question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;

    Ok(assembly::question_content_from_bank(&question, &options))
}

pub(super) async fn bank_group_content(
    pool: &PgPool,
    group_id: &str,
    expected_part_id: i32,
) -> Result<GroupContent, ApiError> {
    let group = repositories::questions::find_group_by_id(pool, group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question group"))?
        .ok_or_else(|| ApiError::NotFound(format!("Question group {group_id} not found")))?;

    if group.part_id != expected_part_id {
        return Err(ApiError::BadRequest(format!(
            "group {group_id} belongs to part {}, not part {expected_part_id}",
            group.part_id
        )));
    }

    let members = repositories::questions::list_group_members(pool, group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch group questions"))?;

    let mut contents = Vec::with_capacity(members.len());
    for member in &members {
        let options = repositories::questions::list_options(pool, &member.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch options"))?;
        contents.push(assembly::question_content_from_bank(member, &options));
    }

    Ok(assembly::group_content_from_bank(&group, contents))
}

pub(super) async fn bank_parts_to_content(
    pool: &PgPool,
    parts: &[BankPartPayload],
) -> Result<Vec<PartContent>, ApiError> {
    let mut contents = Vec::with_capacity(parts.len());
    for part in parts {
        let mut questions = Vec::with_capacity(part.question_ids.len());
        for question_id in &part.question_ids {
            questions.push(bank_question_content(pool, question_id, part.part_id).await?);
        }
        let mut groups = Vec::with_capacity(part.group_ids.len());
        for group_id in &part.group_ids {
            groups.push(bank_group_content(pool, group_id, part.part_id).await?);
        }
        contents.push(PartContent { part_id: part.part_id, questions, groups });
    }
    Ok(contents)
}

/// Write the frozen test questions inside the assembly transaction. Order
/// follows the payload: singles first, then groups, part by part.
pub(super) async fn insert_test_questions(
    tx: &mut Transaction<'_, Postgres>,
    test: &Test,
    parts: &[PartContent],
) -> Result<(), ApiError> {
    let mut order = 0i32;

    for part in parts {
        for question in &part.questions {
            order += 1;
            let snapshot = assembly::single_snapshot(question);
            insert_one(tx, test, part.part_id, order, question.source_question_id.as_deref(), None, &snapshot)
                .await?;
        }
        for group in &part.groups {
            order += 1;
            let snapshot = assembly::group_snapshot(group);
            insert_one(tx, test, part.part_id, order, None, group.source_group_id.as_deref(), &snapshot)
                .await?;
        }
    }

    Ok(())
}

async fn insert_one(
    tx: &mut Transaction<'_, Postgres>,
    test: &Test,
    part_id: i32,
    order_in_test: i32,
    source_question_id: Option<&str>,
    source_group_id: Option<&str>,
    snapshot: &TestQuestionSnapshot,
) -> Result<(), ApiError> {
    repositories::tests::create_question(
        &mut **tx,
        repositories::tests::CreateTestQuestion {
            id: &Uuid::new_v4().to_string(),
            test_id: &test.id,
            part_id,
            order_in_test,
            source_question_id,
            source_group_id,
            snapshot,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create test question"))
}
