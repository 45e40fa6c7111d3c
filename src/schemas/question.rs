use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Question, QuestionGroup, QuestionOption};
use crate::schemas::test::ManualOptionPayload;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(range(min = 1, max = 15, message = "part_id must be 1-15"))]
    pub(crate) part_id: i32,
    pub(crate) group_id: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) explanation: Option<String>,
    #[serde(default)]
    pub(crate) options: Vec<ManualOptionPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionUpdate {
    pub(crate) content: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) explanation: Option<String>,
    /// When present, the option set is replaced wholesale.
    pub(crate) options: Option<Vec<ManualOptionPayload>>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GroupCreate {
    #[validate(range(min = 1, max = 15, message = "part_id must be 1-15"))]
    pub(crate) part_id: i32,
    pub(crate) passage: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct OptionResponse {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) content: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) part_id: i32,
    pub(crate) group_id: Option<String>,
    pub(crate) content: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) explanation: Option<String>,
    pub(crate) options: Vec<OptionResponse>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupResponse {
    pub(crate) id: String,
    pub(crate) part_id: i32,
    pub(crate) passage: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) created_at: String,
}

pub(crate) fn question_to_response(
    question: Question,
    options: Vec<QuestionOption>,
) -> QuestionResponse {
    QuestionResponse {
        id: question.id,
        part_id: question.part_id,
        group_id: question.group_id,
        content: question.content,
        image_url: question.image_url,
        audio_url: question.audio_url,
        explanation: question.explanation,
        options: options
            .into_iter()
            .map(|option| OptionResponse {
                id: option.id,
                label: option.label,
                content: option.content,
                is_correct: option.is_correct,
            })
            .collect(),
        created_at: format_primitive(question.created_at),
        updated_at: format_primitive(question.updated_at),
    }
}

pub(crate) fn group_to_response(group: QuestionGroup) -> GroupResponse {
    GroupResponse {
        id: group.id,
        part_id: group.part_id,
        passage: group.passage,
        image_url: group.image_url,
        audio_url: group.audio_url,
        created_at: format_primitive(group.created_at),
    }
}
