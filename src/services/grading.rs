use std::collections::HashMap;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{TestQuestion, TestResult};
use crate::db::snapshot::TestQuestionSnapshot;
use crate::db::types::{part_skill, AiScorer, ScoredSkill, TestResultStatus, TestSkill};
use crate::repositories;
use crate::repositories::skill_scores::CreateSkillScore;
use crate::repositories::test_results::{LrScoreUpdate, SwScoreUpdate};
use crate::schemas::assessment::{
    AssessmentPartPayload, BulkAssessmentResponse, FailedPart, SkillSummary,
};
use crate::schemas::result::{feedback_to_response, FeedbackResponse, GeneralLrResult};
use crate::services::ai_scoring::{self, GroupQuestionRef, ScoreRequest};
use crate::services::scoring;

/// Grade an LR attempt. Idempotent: a row that already left InProgress is
/// never rescanned; the stored result is rebuilt and returned unchanged.
/// The conditional status update is the only gate into the write path, so
/// a concurrent user submit and reaper submit cannot both score the row.
pub(crate) async fn submit_lr(
    state: &AppState,
    test_result: &TestResult,
    duration_minutes: i32,
) -> Result<GeneralLrResult> {
    if test_result.status != TestResultStatus::InProgress {
        return cached_lr_result(state, test_result).await;
    }

    let questions = repositories::tests::list_questions(state.db(), &test_result.test_id)
        .await
        .context("Failed to fetch test questions")?;
    let answers = repositories::user_answers::list_by_result(state.db(), &test_result.id)
        .await
        .context("Failed to fetch user answers")?;

    let answer_map: HashMap<scoring::AnswerKey, String> = answers
        .into_iter()
        .filter_map(|answer| {
            answer
                .chosen_label
                .map(|label| ((answer.test_question_id, answer.sub_question_index), label))
        })
        .collect();

    let tally = scoring::tally_lr(&questions, &answer_map);
    let listening_score = tally.listening_score();
    let reading_score = tally.reading_score();
    let total_score = tally.total_score();
    let now = primitive_now_utc();

    let mut tx = state.db().begin().await.context("Failed to start transaction")?;

    let claimed = repositories::test_results::claim_graded_lr(
        &mut *tx,
        &test_result.id,
        LrScoreUpdate {
            duration_minutes,
            total_questions: tally.total_questions,
            correct_count: tally.correct_count,
            incorrect_count: tally.incorrect_count,
            skip_count: tally.skip_count,
            listening_score,
            reading_score,
            total_score: total_score as f64,
        },
        now,
    )
    .await
    .context("Failed to claim test result for grading")?;

    if !claimed {
        tx.rollback().await.ok();
        let fresh = repositories::test_results::fetch_one_by_id(state.db(), &test_result.id)
            .await
            .context("Failed to re-fetch graded test result")?;
        return cached_lr_result(state, &fresh).await;
    }

    repositories::skill_scores::create(
        &mut *tx,
        CreateSkillScore {
            id: &Uuid::new_v4().to_string(),
            test_result_id: &test_result.id,
            skill: ScoredSkill::Listening,
            total_questions: tally.listening_total,
            correct_count: tally.listening_correct,
            score: listening_score as f64,
            created_at: now,
        },
    )
    .await
    .context("Failed to persist listening score")?;

    repositories::skill_scores::create(
        &mut *tx,
        CreateSkillScore {
            id: &Uuid::new_v4().to_string(),
            test_result_id: &test_result.id,
            skill: ScoredSkill::Reading,
            total_questions: tally.reading_total,
            correct_count: tally.reading_correct,
            score: reading_score as f64,
            created_at: now,
        },
    )
    .await
    .context("Failed to persist reading score")?;

    tx.commit().await.context("Failed to commit grading transaction")?;

    metrics::counter!("lr_tests_graded_total").increment(1);
    tracing::info!(
        test_result_id = %test_result.id,
        total_score,
        correct = tally.correct_count,
        skipped = tally.skip_count,
        "LR test graded"
    );

    Ok(GeneralLrResult {
        test_result_id: test_result.id.clone(),
        total_questions: tally.total_questions,
        correct_count: tally.correct_count,
        incorrect_count: tally.incorrect_count,
        skip_count: tally.skip_count,
        duration_minutes,
        total_score,
        listening_correct: tally.listening_correct,
        listening_total: tally.listening_total,
        listening_score,
        reading_correct: tally.reading_correct,
        reading_total: tally.reading_total,
        reading_score,
    })
}

/// Rebuild the LR summary from the stored row and its skill scores.
pub(crate) async fn cached_lr_result(
    state: &AppState,
    test_result: &TestResult,
) -> Result<GeneralLrResult> {
    let skill_scores = repositories::skill_scores::list_by_result(state.db(), &test_result.id)
        .await
        .context("Failed to fetch skill scores")?;

    let listening = skill_scores.iter().find(|score| score.skill == ScoredSkill::Listening);
    let reading = skill_scores.iter().find(|score| score.skill == ScoredSkill::Reading);

    Ok(GeneralLrResult {
        test_result_id: test_result.id.clone(),
        total_questions: test_result.total_questions.unwrap_or(0),
        correct_count: test_result.correct_count.unwrap_or(0),
        incorrect_count: test_result.incorrect_count.unwrap_or(0),
        skip_count: test_result.skip_count.unwrap_or(0),
        duration_minutes: test_result.duration_minutes.unwrap_or(0),
        total_score: test_result.total_score.unwrap_or(0.0) as i32,
        listening_correct: listening.map(|score| score.correct_count).unwrap_or(0),
        listening_total: listening.map(|score| score.total_questions).unwrap_or(0),
        listening_score: test_result.listening_score.unwrap_or(0),
        reading_correct: reading.map(|score| score.correct_count).unwrap_or(0),
        reading_total: reading.map(|score| score.total_questions).unwrap_or(0),
        reading_score: test_result.reading_score.unwrap_or(0),
    })
}

pub(crate) enum BulkOutcome {
    Completed(BulkAssessmentResponse),
    AlreadyGraded,
}

/// Score a batch of Writing/Speaking answers. Blank parts count as skipped.
/// A scorer failure on any answered part leaves the attempt InProgress and
/// is reported per part; the candidate recovers by resubmitting. Only a
/// fully scored batch claims the Graded transition.
pub(crate) async fn submit_bulk_assessment(
    state: &AppState,
    test_result: &TestResult,
    duration_minutes: i32,
    parts: &[AssessmentPartPayload],
) -> Result<BulkOutcome> {
    let questions = repositories::tests::list_questions(state.db(), &test_result.test_id)
        .await
        .context("Failed to fetch test questions")?;
    let by_id: HashMap<&str, &TestQuestion> =
        questions.iter().map(|question| (question.id.as_str(), question)).collect();

    let mut per_part_feedbacks: Vec<FeedbackResponse> = Vec::new();
    let mut failed_parts: Vec<FailedPart> = Vec::new();
    let mut writing_scores: Vec<f64> = Vec::new();
    let mut speaking_scores: Vec<f64> = Vec::new();
    let mut skip_count = 0usize;

    for part in parts {
        let Some(question) = by_id.get(part.test_question_id.as_str()) else {
            failed_parts.push(FailedPart {
                test_question_id: part.test_question_id.clone(),
                error: "test question does not belong to this test".to_string(),
            });
            continue;
        };

        let skill = match part_skill(question.part_id) {
            Some(skill @ (TestSkill::Writing | TestSkill::Speaking)) => skill,
            _ => {
                failed_parts.push(FailedPart {
                    test_question_id: part.test_question_id.clone(),
                    error: format!("part {} is not an AI-scored part", question.part_id),
                });
                continue;
            }
        };

        let answered = match skill {
            TestSkill::Writing => {
                part.answer_text.as_deref().map(str::trim).is_some_and(|text| !text.is_empty())
            }
            _ => part
                .audio_file_url
                .as_deref()
                .map(str::trim)
                .is_some_and(|url| !url.is_empty()),
        };
        if !answered {
            skip_count += 1;
            continue;
        }

        match assess_part(state, test_result, question, part, skill).await {
            Ok((score, feedback)) => {
                match skill {
                    TestSkill::Writing => writing_scores.push(score),
                    _ => speaking_scores.push(score),
                }
                per_part_feedbacks.push(feedback);
            }
            Err(err) => {
                tracing::error!(
                    test_result_id = %test_result.id,
                    test_question_id = %part.test_question_id,
                    error = %err,
                    "Assessment failed for part"
                );
                failed_parts.push(FailedPart {
                    test_question_id: part.test_question_id.clone(),
                    error: err.to_string(),
                });
            }
        }
    }

    if !failed_parts.is_empty() {
        return Ok(BulkOutcome::Completed(BulkAssessmentResponse {
            test_result_id: test_result.id.clone(),
            status: TestResultStatus::InProgress,
            total_questions: parts.len(),
            skip_count,
            writing: None,
            speaking: None,
            writing_score: None,
            speaking_score: None,
            total_score: None,
            per_part_feedbacks,
            failed_parts,
        }));
    }

    let writing_aggregate = scoring::aggregate_skill(TestSkill::Writing, &writing_scores);
    let speaking_aggregate = scoring::aggregate_skill(TestSkill::Speaking, &speaking_scores);

    let writing_scaled = writing_aggregate.as_ref().map(|agg| agg.scaled_score as f64);
    let speaking_scaled = speaking_aggregate.as_ref().map(|agg| agg.scaled_score as f64);
    let total_score = match (writing_scaled, speaking_scaled) {
        (None, None) => None,
        (writing, speaking) => Some(writing.unwrap_or(0.0) + speaking.unwrap_or(0.0)),
    };

    let now = primitive_now_utc();
    let mut tx = state.db().begin().await.context("Failed to start transaction")?;

    let claimed = repositories::test_results::claim_graded_sw(
        &mut *tx,
        &test_result.id,
        SwScoreUpdate {
            duration_minutes,
            total_questions: parts.len() as i32,
            skip_count: skip_count as i32,
            writing_score: writing_scaled,
            speaking_score: speaking_scaled,
            total_score,
        },
        now,
    )
    .await
    .context("Failed to claim test result for grading")?;

    if !claimed {
        tx.rollback().await.ok();
        return Ok(BulkOutcome::AlreadyGraded);
    }

    for aggregate in [&writing_aggregate, &speaking_aggregate].into_iter().flatten() {
        let skill = match aggregate.skill {
            TestSkill::Writing => ScoredSkill::Writing,
            _ => ScoredSkill::Speaking,
        };
        repositories::skill_scores::create(
            &mut *tx,
            CreateSkillScore {
                id: &Uuid::new_v4().to_string(),
                test_result_id: &test_result.id,
                skill,
                total_questions: aggregate.completed_parts as i32,
                correct_count: 0,
                score: aggregate.scaled_score as f64,
                created_at: now,
            },
        )
        .await
        .context("Failed to persist skill score")?;
    }

    tx.commit().await.context("Failed to commit grading transaction")?;

    metrics::counter!("sw_tests_graded_total").increment(1);
    tracing::info!(
        test_result_id = %test_result.id,
        writing_score = ?writing_scaled,
        speaking_score = ?speaking_scaled,
        "Writing/Speaking assessment graded"
    );

    Ok(BulkOutcome::Completed(BulkAssessmentResponse {
        test_result_id: test_result.id.clone(),
        status: TestResultStatus::Graded,
        total_questions: parts.len(),
        skip_count,
        writing: writing_aggregate.as_ref().map(SkillSummary::from),
        speaking: speaking_aggregate.as_ref().map(SkillSummary::from),
        writing_score: writing_scaled,
        speaking_score: speaking_scaled,
        total_score,
        per_part_feedbacks,
        failed_parts,
    }))
}

async fn assess_part(
    state: &AppState,
    test_result: &TestResult,
    question: &TestQuestion,
    part: &AssessmentPartPayload,
    skill: TestSkill,
) -> Result<(f64, FeedbackResponse)> {
    let task_type = ai_scoring::task_type_for_part(question.part_id)
        .context("No scorer task type for this part")?;
    let now = primitive_now_utc();

    let answer = repositories::user_answers::upsert(
        state.db(),
        repositories::user_answers::UpsertUserAnswer {
            id: &Uuid::new_v4().to_string(),
            test_result_id: &test_result.id,
            test_question_id: &question.id,
            sub_question_index: 0,
            chosen_label: None,
            answer_text: part.answer_text.as_deref(),
            answer_audio_url: part.audio_file_url.as_deref(),
            now,
        },
    )
    .await
    .context("Failed to save answer")?;

    let snapshot = &question.snapshot.0;
    let (reference_text, question_context, image_url) = match snapshot.question(0) {
        Some(first) => {
            (first.content.clone(), first.explanation.clone(), first.image_url.clone())
        }
        None => (None, None, None),
    };
    let group_questions: Vec<GroupQuestionRef> = match snapshot {
        TestQuestionSnapshot::Group(group) => group
            .questions
            .iter()
            .enumerate()
            .map(|(index, member)| GroupQuestionRef {
                order: index + 1,
                content: member.content.clone().unwrap_or_default(),
            })
            .collect(),
        TestQuestionSnapshot::Single(_) => Vec::new(),
    };

    let request = ScoreRequest {
        test_question_id: question.id.clone(),
        task_type,
        question_number: question.order_in_test,
        answer_text: part.answer_text.clone(),
        audio_file_url: part.audio_file_url.clone(),
        reference_text,
        question_context,
        passage: snapshot.passage().map(str::to_string),
        questions: group_questions,
        image_url: image_url.clone(),
    };

    let (scorer, result) = match skill {
        TestSkill::Writing => {
            (AiScorer::Writing, state.writing_client().assess(&request).await?)
        }
        _ => (AiScorer::Speaking, state.speaking_client().assess(&request).await?),
    };

    let content = ai_scoring::content_summary(&result);
    let wants_image = matches!(task_type, "write_sentence" | "describe_picture");

    let feedback = repositories::ai_feedback::create(
        state.db(),
        repositories::ai_feedback::CreateAiFeedback {
            id: &Uuid::new_v4().to_string(),
            user_answer_id: &answer.id,
            scorer,
            score: result.overall_score,
            content: &content,
            detailed_scores: result.scores.clone(),
            detailed_analysis: result.detailed_analysis.clone(),
            recommendations: result.recommendations.clone(),
            transcription: result.transcription.as_deref(),
            corrected_text: result.corrected_text.as_deref(),
            audio_duration: result.audio_duration,
            audio_file_url: part.audio_file_url.as_deref(),
            image_file_url: if wants_image { image_url.as_deref() } else { None },
            created_at: now,
        },
    )
    .await
    .context("Failed to persist AI feedback")?;

    Ok((result.overall_score, feedback_to_response(feedback)))
}
