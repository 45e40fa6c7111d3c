use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::snapshot::TestQuestionSnapshot;
use crate::db::types::{
    AiScorer, ScoredSkill, TestResultStatus, TestSkill, TestStatus, TestType, UserRole,
};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Part {
    pub(crate) id: i32,
    pub(crate) label: String,
    pub(crate) skill: TestSkill,
}

/// Live bank question. Referenced at assembly time only; a delivered test
/// holds its own snapshot, never this row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) part_id: i32,
    pub(crate) group_id: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) explanation: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionOption {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) label: String,
    pub(crate) content: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuestionGroup {
    pub(crate) id: String,
    pub(crate) part_id: i32,
    pub(crate) passage: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Test {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) skill: TestSkill,
    pub(crate) test_type: TestType,
    pub(crate) duration_minutes: i32,
    pub(crate) status: TestStatus,
    pub(crate) parent_test_id: Option<String>,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
    pub(crate) published_at: Option<PrimitiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TestQuestion {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) part_id: i32,
    pub(crate) order_in_test: i32,
    pub(crate) source_question_id: Option<String>,
    pub(crate) source_group_id: Option<String>,
    pub(crate) snapshot: Json<TestQuestionSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TestResult {
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
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct UserAnswer {
    pub(crate) id: String,
    pub(crate) test_result_id: String,
    pub(crate) test_question_id: String,
    pub(crate) sub_question_index: i32,
    pub(crate) chosen_label: Option<String>,
    pub(crate) answer_text: Option<String>,
    pub(crate) answer_audio_url: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Append-only AI scorer output; the newest row per user answer wins.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AiFeedback {
    pub(crate) id: String,
    pub(crate) user_answer_id: String,
    pub(crate) scorer: AiScorer,
    pub(crate) score: f64,
    pub(crate) content: String,
    pub(crate) detailed_scores: Json<serde_json::Value>,
    pub(crate) detailed_analysis: Json<serde_json::Value>,
    pub(crate) recommendations: Json<Vec<String>>,
    pub(crate) transcription: Option<String>,
    pub(crate) corrected_text: Option<String>,
    pub(crate) audio_duration: Option<f64>,
    pub(crate) audio_file_url: Option<String>,
    pub(crate) image_file_url: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SkillScore {
    pub(crate) id: String,
    pub(crate) test_result_id: String,
    pub(crate) skill: ScoredSkill,
    pub(crate) total_questions: i32,
    pub(crate) correct_count: i32,
    pub(crate) score: f64,
    pub(crate) created_at: PrimitiveDateTime,
}
