use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::types::TestResultStatus;
use crate::schemas::result::FeedbackResponse;
use crate::services::scoring::SkillAggregate;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BulkAssessmentRequest {
    #[validate(range(min = 0, max = 600, message = "duration_minutes must be 0-600"))]
    pub(crate) duration_minutes: i32,
    #[validate(length(min = 1, message = "at least one part is required"))]
    pub(crate) parts: Vec<AssessmentPartPayload>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct AssessmentPartPayload {
    pub(crate) test_question_id: String,
    /// Client hint only; the engine derives the task type from the
    /// delivered question's part.
    #[serde(default)]
    pub(crate) part_type: Option<String>,
    pub(crate) answer_text: Option<String>,
    pub(crate) audio_file_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FailedPart {
    pub(crate) test_question_id: String,
    pub(crate) error: String,
}

/// Per-skill aggregation of the AI part scores: the mean (0-100), how many
/// of the skill's parts were scored, and the 0-200 reported band.
#[derive(Debug, Serialize)]
pub(crate) struct SkillSummary {
    pub(crate) total_score: f64,
    pub(crate) completed_parts: usize,
    pub(crate) total_parts: usize,
    pub(crate) is_complete: bool,
    pub(crate) scaled_score: i32,
}

impl From<&SkillAggregate> for SkillSummary {
    fn from(aggregate: &SkillAggregate) -> Self {
        Self {
            total_score: aggregate.total_score,
            completed_parts: aggregate.completed_parts,
            total_parts: aggregate.total_parts,
            is_complete: aggregate.is_complete,
            scaled_score: aggregate.scaled_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkAssessmentResponse {
    pub(crate) test_result_id: String,
    pub(crate) status: TestResultStatus,
    pub(crate) total_questions: usize,
    pub(crate) skip_count: usize,
    pub(crate) writing: Option<SkillSummary>,
    pub(crate) speaking: Option<SkillSummary>,
    pub(crate) writing_score: Option<f64>,
    pub(crate) speaking_score: Option<f64>,
    pub(crate) total_score: Option<f64>,
    pub(crate) per_part_feedbacks: Vec<FeedbackResponse>,
    pub(crate) failed_parts: Vec<FailedPart>,
}
