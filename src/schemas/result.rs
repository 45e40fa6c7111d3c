use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{AiFeedback, SkillScore, TestResult};
use crate::db::types::{AiScorer, ScoredSkill, TestResultStatus};
use crate::schemas::test::TestDetailResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StartTestRequest {
    #[validate(length(min = 1, message = "test_id is required"))]
    pub(crate) test_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StartTestResponse {
    pub(crate) test_result_id: String,
    pub(crate) status: TestResultStatus,
    pub(crate) started_at: String,
    pub(crate) test: TestDetailResponse,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SaveAnswerRequest {
    #[validate(length(min = 1, message = "test_question_id is required"))]
    pub(crate) test_question_id: String,
    #[serde(default)]
    pub(crate) sub_question_index: i32,
    #[validate(length(min = 1, max = 1, message = "chosen_label must be a single letter"))]
    pub(crate) chosen_label: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveAnswerResponse {
    pub(crate) success: bool,
    pub(crate) saved_at: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitLrRequest {
    #[validate(length(min = 1, message = "test_id is required"))]
    pub(crate) test_id: String,
    #[validate(range(min = 0, max = 600, message = "duration_minutes must be 0-600"))]
    pub(crate) duration_minutes: i32,
    #[serde(default)]
    pub(crate) answers: Vec<LrAnswerPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LrAnswerPayload {
    pub(crate) test_question_id: String,
    #[serde(default)]
    pub(crate) sub_question_index: i32,
    pub(crate) chosen_label: Option<String>,
}

/// The graded LR summary. Rebuilt byte-for-byte from stored fields on a
/// repeat submission, so both calls serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct GeneralLrResult {
    pub(crate) test_result_id: String,
    pub(crate) total_questions: i32,
    pub(crate) correct_count: i32,
    pub(crate) incorrect_count: i32,
    pub(crate) skip_count: i32,
    pub(crate) duration_minutes: i32,
    pub(crate) total_score: i32,
    pub(crate) listening_correct: i32,
    pub(crate) listening_total: i32,
    pub(crate) listening_score: i32,
    pub(crate) reading_correct: i32,
    pub(crate) reading_total: i32,
    pub(crate) reading_score: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct SkillScoreResponse {
    pub(crate) skill: ScoredSkill,
    pub(crate) total_questions: i32,
    pub(crate) correct_count: i32,
    pub(crate) score: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct FeedbackResponse {
    pub(crate) feedback_id: String,
    pub(crate) user_answer_id: String,
    pub(crate) scorer: AiScorer,
    pub(crate) score: f64,
    pub(crate) content: String,
    pub(crate) detailed_scores: serde_json::Value,
    pub(crate) detailed_analysis: serde_json::Value,
    pub(crate) recommendations: Vec<String>,
    pub(crate) transcription: Option<String>,
    pub(crate) corrected_text: Option<String>,
    pub(crate) audio_duration: Option<f64>,
    pub(crate) created_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResultDetail {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) test_id: String,
    pub(crate) status: TestResultStatus,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) total_questions: Option<i32>,
    pub(crate) correct_count: Option<i32>,
    pub(crate) incorrect_count: Option<i32>,
    pub(crate) skip_count: Option<i32>,
    pub(crate) listening_score: Option<i32>,
    pub(crate) reading_score: Option<i32>,
    pub(crate) writing_score: Option<f64>,
    pub(crate) speaking_score: Option<f64>,
    pub(crate) total_score: Option<f64>,
    pub(crate) skill_scores: Vec<SkillScoreResponse>,
    pub(crate) feedbacks: Vec<FeedbackResponse>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

pub(crate) fn feedback_to_response(feedback: AiFeedback) -> FeedbackResponse {
    FeedbackResponse {
        feedback_id: feedback.id,
        user_answer_id: feedback.user_answer_id,
        scorer: feedback.scorer,
        score: feedback.score,
        content: feedback.content,
        detailed_scores: feedback.detailed_scores.0,
        detailed_analysis: feedback.detailed_analysis.0,
        recommendations: feedback.recommendations.0,
        transcription: feedback.transcription,
        corrected_text: feedback.corrected_text,
        audio_duration: feedback.audio_duration,
        created_at: format_primitive(feedback.created_at),
    }
}

pub(crate) fn result_to_detail(
    result: TestResult,
    skill_scores: Vec<SkillScore>,
    feedbacks: Vec<AiFeedback>,
) -> TestResultDetail {
    TestResultDetail {
        id: result.id,
        user_id: result.user_id,
        test_id: result.test_id,
        status: result.status,
        duration_minutes: result.duration_minutes,
        total_questions: result.total_questions,
        correct_count: result.correct_count,
        incorrect_count: result.incorrect_count,
        skip_count: result.skip_count,
        listening_score: result.listening_score,
        reading_score: result.reading_score,
        writing_score: result.writing_score,
        speaking_score: result.speaking_score,
        total_score: result.total_score,
        skill_scores: skill_scores
            .into_iter()
            .map(|score| SkillScoreResponse {
                skill: score.skill,
                total_questions: score.total_questions,
                correct_count: score.correct_count,
                score: score.score,
            })
            .collect(),
        feedbacks: feedbacks.into_iter().map(feedback_to_response).collect(),
        created_at: format_primitive(result.created_at),
        updated_at: format_primitive(result.updated_at),
    }
}
