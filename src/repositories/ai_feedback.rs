use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::AiFeedback;
use crate::db::types::AiScorer;

pub(crate) const COLUMNS: &str = "\
    id, user_answer_id, scorer, score, content, detailed_scores, detailed_analysis, \
    recommendations, transcription, corrected_text, audio_duration, audio_file_url, \
    image_file_url, created_at";

pub(crate) struct CreateAiFeedback<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_answer_id: &'a str,
    pub(crate) scorer: AiScorer,
    pub(crate) score: f64,
    pub(crate) content: &'a str,
    pub(crate) detailed_scores: serde_json::Value,
    pub(crate) detailed_analysis: serde_json::Value,
    pub(crate) recommendations: Vec<String>,
    pub(crate) transcription: Option<&'a str>,
    pub(crate) corrected_text: Option<&'a str>,
    pub(crate) audio_duration: Option<f64>,
    pub(crate) audio_file_url: Option<&'a str>,
    pub(crate) image_file_url: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Feedback rows are append-only; a resubmission inserts a new row and
/// readers pick the newest per answer.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    feedback: CreateAiFeedback<'_>,
) -> Result<AiFeedback, sqlx::Error> {
    sqlx::query_as::<_, AiFeedback>(&format!(
        "INSERT INTO ai_feedback (id, user_answer_id, scorer, score, content, detailed_scores,
                                  detailed_analysis, recommendations, transcription, corrected_text,
                                  audio_duration, audio_file_url, image_file_url, created_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14)
         RETURNING {COLUMNS}"
    ))
    .bind(feedback.id)
    .bind(feedback.user_answer_id)
    .bind(feedback.scorer)
    .bind(feedback.score)
    .bind(feedback.content)
    .bind(sqlx::types::Json(feedback.detailed_scores))
    .bind(sqlx::types::Json(feedback.detailed_analysis))
    .bind(sqlx::types::Json(feedback.recommendations))
    .bind(feedback.transcription)
    .bind(feedback.corrected_text)
    .bind(feedback.audio_duration)
    .bind(feedback.audio_file_url)
    .bind(feedback.image_file_url)
    .bind(feedback.created_at)
    .fetch_one(executor)
    .await
}

/// Newest feedback row per user answer for one attempt.
pub(crate) async fn list_latest_by_result(
    pool: &PgPool,
    test_result_id: &str,
) -> Result<Vec<AiFeedback>, sqlx::Error> {
    sqlx::query_as::<_, AiFeedback>(&format!(
        "SELECT DISTINCT ON (f.user_answer_id) {columns}
         FROM ai_feedback f
         JOIN user_answers a ON a.id = f.user_answer_id
         WHERE a.test_result_id = $1
         ORDER BY f.user_answer_id, f.created_at DESC",
        columns = COLUMNS
            .split(", ")
            .map(|column| format!("f.{}", column.trim()))
            .collect::<Vec<_>>()
            .join(", ")
    ))
    .bind(test_result_id)
    .fetch_all(pool)
    .await
}
