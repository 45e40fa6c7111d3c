use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::SkillScore;
use crate::db::types::ScoredSkill;

pub(crate) const COLUMNS: &str =
    "id, test_result_id, skill, total_questions, correct_count, score, created_at";

pub(crate) struct CreateSkillScore<'a> {
    pub(crate) id: &'a str,
    pub(crate) test_result_id: &'a str,
    pub(crate) skill: ScoredSkill,
    pub(crate) total_questions: i32,
    pub(crate) correct_count: i32,
    pub(crate) score: f64,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    score: CreateSkillScore<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO skill_scores (id, test_result_id, skill, total_questions, correct_count, score, created_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)",
    )
    .bind(score.id)
    .bind(score.test_result_id)
    .bind(score.skill)
    .bind(score.total_questions)
    .bind(score.correct_count)
    .bind(score.score)
    .bind(score.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn list_by_result(
    pool: &PgPool,
    test_result_id: &str,
) -> Result<Vec<SkillScore>, sqlx::Error> {
    sqlx::query_as::<_, SkillScore>(&format!(
        "SELECT {COLUMNS} FROM skill_scores WHERE test_result_id = $1 ORDER BY skill"
    ))
    .bind(test_result_id)
    .fetch_all(pool)
    .await
}
