use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Question, QuestionGroup, QuestionOption};

pub(crate) const QUESTION_COLUMNS: &str = "\
    id, part_id, group_id, content, image_url, audio_url, explanation, created_at, updated_at";

pub(crate) const GROUP_COLUMNS: &str =
    "id, part_id, passage, image_url, audio_url, created_at, updated_at";

pub(crate) const OPTION_COLUMNS: &str = "id, question_id, label, content, is_correct";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) part_id: i32,
    pub(crate) group_id: Option<&'a str>,
    pub(crate) content: Option<&'a str>,
    pub(crate) image_url: Option<&'a str>,
    pub(crate) audio_url: Option<&'a str>,
    pub(crate) explanation: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct CreateOption<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) label: &'a str,
    pub(crate) content: &'a str,
    pub(crate) is_correct: bool,
}

pub(crate) struct CreateGroup<'a> {
    pub(crate) id: &'a str,
    pub(crate) part_id: i32,
    pub(crate) passage: Option<&'a str>,
    pub(crate) image_url: Option<&'a str>,
    pub(crate) audio_url: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct UpdateQuestion<'a> {
    pub(crate) content: Option<&'a str>,
    pub(crate) image_url: Option<&'a str>,
    pub(crate) audio_url: Option<&'a str>,
    pub(crate) explanation: Option<&'a str>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    question: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (id, part_id, group_id, content, image_url, audio_url, explanation, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
         RETURNING {QUESTION_COLUMNS}"
    ))
    .bind(question.id)
    .bind(question.part_id)
    .bind(question.group_id)
    .bind(question.content)
    .bind(question.image_url)
    .bind(question.audio_url)
    .bind(question.explanation)
    .bind(question.created_at)
    .bind(question.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn create_option(
    executor: impl sqlx::PgExecutor<'_>,
    option: CreateOption<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO options (id, question_id, label, content, is_correct)
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(option.id)
    .bind(option.question_id)
    .bind(option.label)
    .bind(option.content)
    .bind(option.is_correct)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn create_group(
    executor: impl sqlx::PgExecutor<'_>,
    group: CreateGroup<'_>,
) -> Result<QuestionGroup, sqlx::Error> {
    sqlx::query_as::<_, QuestionGroup>(&format!(
        "INSERT INTO question_groups (id, part_id, passage, image_url, audio_url, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {GROUP_COLUMNS}"
    ))
    .bind(group.id)
    .bind(group.part_id)
    .bind(group.passage)
    .bind(group.image_url)
    .bind(group.audio_url)
    .bind(group.created_at)
    .bind(group.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_group_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<QuestionGroup>, sqlx::Error> {
    sqlx::query_as::<_, QuestionGroup>(&format!(
        "SELECT {GROUP_COLUMNS} FROM question_groups WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_options(
    pool: &PgPool,
    question_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM options WHERE question_id = $1 ORDER BY label"
    ))
    .bind(question_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_group_members(
    pool: &PgPool,
    group_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE group_id = $1 ORDER BY created_at, id"
    ))
    .bind(group_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    update: UpdateQuestion<'_>,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions
         SET content = COALESCE($1, content),
             image_url = COALESCE($2, image_url),
             audio_url = COALESCE($3, audio_url),
             explanation = COALESCE($4, explanation),
             updated_at = $5
         WHERE id = $6
         RETURNING {QUESTION_COLUMNS}"
    ))
    .bind(update.content)
    .bind(update.image_url)
    .bind(update.audio_url)
    .bind(update.explanation)
    .bind(update.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Replaces the option set wholesale; callers run this inside the same
/// transaction as the question update.
pub(crate) async fn delete_options(
    executor: impl sqlx::PgExecutor<'_>,
    question_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM options WHERE question_id = $1")
        .bind(question_id)
        .execute(executor)
        .await?;
    Ok(())
}
