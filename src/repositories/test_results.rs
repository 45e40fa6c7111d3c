use sqlx::{FromRow, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::TestResult;
use crate::db::types::{TestResultStatus, TestSkill};

pub(crate) const COLUMNS: &str = "\
    id, user_id, test_id, status, duration_minutes, total_questions, correct_count, \
    incorrect_count, skip_count, listening_score, reading_score, writing_score, \
    speaking_score, total_score, created_at, updated_at";

pub(crate) struct CreateTestResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) status: TestResultStatus,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Score fields written by the LR grading claim, all in one statement.
pub(crate) struct LrScoreUpdate {
    pub(crate) duration_minutes: i32,
    pub(crate) total_questions: i32,
    pub(crate) correct_count: i32,
    pub(crate) incorrect_count: i32,
    pub(crate) skip_count: i32,
    pub(crate) listening_score: i32,
    pub(crate) reading_score: i32,
    pub(crate) total_score: f64,
}

pub(crate) struct SwScoreUpdate {
    pub(crate) duration_minutes: i32,
    pub(crate) total_questions: i32,
    pub(crate) skip_count: i32,
    pub(crate) writing_score: Option<f64>,
    pub(crate) speaking_score: Option<f64>,
    pub(crate) total_score: Option<f64>,
}

/// An InProgress result joined with the test fields the reaper needs.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct InProgressCandidate {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) test_id: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) test_duration_minutes: i32,
    pub(crate) test_skill: TestSkill,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    result: CreateTestResult<'_>,
) -> Result<TestResult, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(&format!(
        "INSERT INTO test_results (id, user_id, test_id, status, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(result.id)
    .bind(result.user_id)
    .bind(result.test_id)
    .bind(result.status)
    .bind(result.created_at)
    .bind(result.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<TestResult>, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(&format!("SELECT {COLUMNS} FROM test_results WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<TestResult, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(&format!("SELECT {COLUMNS} FROM test_results WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Snapshot of every InProgress attempt with its test's duration and skill;
/// the reaper filters by elapsed time in memory so the query holds no locks.
pub(crate) async fn list_in_progress_with_test(
    pool: &PgPool,
) -> Result<Vec<InProgressCandidate>, sqlx::Error> {
    sqlx::query_as::<_, InProgressCandidate>(
        "SELECT r.id, r.user_id, r.test_id, r.created_at,
                t.duration_minutes AS test_duration_minutes,
                t.skill AS test_skill
         FROM test_results r
         JOIN tests t ON t.id = r.test_id
         WHERE r.status = $1",
    )
    .bind(TestResultStatus::InProgress)
    .fetch_all(pool)
    .await
}

/// The only gate into the Graded state for LR attempts: an atomic
/// check-and-set on `status`. Returns false when another submitter (user
/// or reaper) already claimed the row.
pub(crate) async fn claim_graded_lr(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    update: LrScoreUpdate,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE test_results
         SET status = $1, duration_minutes = $2, total_questions = $3, correct_count = $4,
             incorrect_count = $5, skip_count = $6, listening_score = $7, reading_score = $8,
             total_score = $9, updated_at = $10
         WHERE id = $11 AND status = $12",
    )
    .bind(TestResultStatus::Graded)
    .bind(update.duration_minutes)
    .bind(update.total_questions)
    .bind(update.correct_count)
    .bind(update.incorrect_count)
    .bind(update.skip_count)
    .bind(update.listening_score)
    .bind(update.reading_score)
    .bind(update.total_score)
    .bind(now)
    .bind(id)
    .bind(TestResultStatus::InProgress)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn claim_graded_sw(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    update: SwScoreUpdate,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE test_results
         SET status = $1, duration_minutes = $2, total_questions = $3, skip_count = $4,
             writing_score = $5, speaking_score = $6, total_score = $7, updated_at = $8
         WHERE id = $9 AND status = $10",
    )
    .bind(TestResultStatus::Graded)
    .bind(update.duration_minutes)
    .bind(update.total_questions)
    .bind(update.skip_count)
    .bind(update.writing_score)
    .bind(update.speaking_score)
    .bind(update.total_score)
    .bind(now)
    .bind(id)
    .bind(TestResultStatus::InProgress)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Expired Writing/Speaking attempts park here with NULL scores until the
/// out-of-band grading pass picks them up.
pub(crate) async fn claim_pending_manual_grading(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    duration_minutes: i32,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE test_results
         SET status = $1, duration_minutes = $2, updated_at = $3
         WHERE id = $4 AND status = $5",
    )
    .bind(TestResultStatus::PendingManualGrading)
    .bind(duration_minutes)
    .bind(now)
    .bind(id)
    .bind(TestResultStatus::InProgress)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
