use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::UserAnswer;

pub(crate) const COLUMNS: &str = "\
    id, test_result_id, test_question_id, sub_question_index, chosen_label, \
    answer_text, answer_audio_url, created_at, updated_at";

pub(crate) struct UpsertUserAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) test_result_id: &'a str,
    pub(crate) test_question_id: &'a str,
    pub(crate) sub_question_index: i32,
    pub(crate) chosen_label: Option<&'a str>,
    pub(crate) answer_text: Option<&'a str>,
    pub(crate) answer_audio_url: Option<&'a str>,
    pub(crate) now: PrimitiveDateTime,
}

/// Last-write-wins per (result, question, sub-question); no history is kept.
pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    answer: UpsertUserAnswer<'_>,
) -> Result<UserAnswer, sqlx::Error> {
    sqlx::query_as::<_, UserAnswer>(&format!(
        "INSERT INTO user_answers (id, test_result_id, test_question_id, sub_question_index,
                                   chosen_label, answer_text, answer_audio_url, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         ON CONFLICT (test_result_id, test_question_id, sub_question_index)
         DO UPDATE SET chosen_label = EXCLUDED.chosen_label,
                       answer_text = EXCLUDED.answer_text,
                       answer_audio_url = EXCLUDED.answer_audio_url,
                       updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(answer.id)
    .bind(answer.test_result_id)
    .bind(answer.test_question_id)
    .bind(answer.sub_question_index)
    .bind(answer.chosen_label)
    .bind(answer.answer_text)
    .bind(answer.answer_audio_url)
    .bind(answer.now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_result(
    pool: &PgPool,
    test_result_id: &str,
) -> Result<Vec<UserAnswer>, sqlx::Error> {
    sqlx::query_as::<_, UserAnswer>(&format!(
        "SELECT {COLUMNS} FROM user_answers
         WHERE test_result_id = $1
         ORDER BY test_question_id, sub_question_index"
    ))
    .bind(test_result_id)
    .fetch_all(pool)
    .await
}
