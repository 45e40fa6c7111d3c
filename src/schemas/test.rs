use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Test, TestQuestion};
use crate::db::snapshot::{GroupSnapshot, QuestionSnapshot, TestQuestionSnapshot};
use crate::db::types::{TestSkill, TestStatus, TestType};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreateManual {
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) skill: TestSkill,
    pub(crate) test_type: TestType,
    #[validate(range(min = 1, max = 600, message = "duration_minutes must be 1-600"))]
    pub(crate) duration_minutes: i32,
    pub(crate) parts: Vec<ManualPartPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManualPartPayload {
    pub(crate) part_id: i32,
    #[serde(default)]
    pub(crate) questions: Vec<ManualQuestionPayload>,
    #[serde(default)]
    pub(crate) groups: Vec<ManualGroupPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManualQuestionPayload {
    pub(crate) content: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) explanation: Option<String>,
    #[serde(default)]
    pub(crate) options: Vec<ManualOptionPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManualOptionPayload {
    pub(crate) label: String,
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ManualGroupPayload {
    pub(crate) passage: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) questions: Vec<ManualQuestionPayload>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreateFromBank {
    #[validate(length(min = 1, max = 255, message = "title is required"))]
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) skill: TestSkill,
    pub(crate) test_type: TestType,
    #[validate(range(min = 1, max = 600, message = "duration_minutes must be 1-600"))]
    pub(crate) duration_minutes: i32,
    pub(crate) parts: Vec<BankPartPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BankPartPayload {
    pub(crate) part_id: i32,
    #[serde(default)]
    pub(crate) question_ids: Vec<String>,
    #[serde(default)]
    pub(crate) group_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) skill: TestSkill,
    pub(crate) test_type: TestType,
    pub(crate) duration_minutes: i32,
    pub(crate) status: TestStatus,
    pub(crate) parent_test_id: Option<String>,
    pub(crate) question_count: usize,
    pub(crate) created_at: String,
    pub(crate) published_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestDetailResponse {
    #[serde(flatten)]
    pub(crate) test: TestResponse,
    pub(crate) questions: Vec<TestQuestionView>,
}

/// A test question as delivered to a candidate: answer keys and
/// explanations are stripped from the snapshot.
#[derive(Debug, Serialize)]
pub(crate) struct TestQuestionView {
    pub(crate) id: String,
    pub(crate) part_id: i32,
    pub(crate) order_in_test: i32,
    pub(crate) snapshot: DeliveredSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(crate) enum DeliveredSnapshot {
    Single(DeliveredQuestion),
    Group(DeliveredGroup),
}

#[derive(Debug, Serialize)]
pub(crate) struct DeliveredQuestion {
    pub(crate) content: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) options: Vec<DeliveredOption>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeliveredOption {
    pub(crate) label: String,
    pub(crate) content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeliveredGroup {
    pub(crate) passage: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) questions: Vec<DeliveredQuestion>,
}

fn deliver_question(snapshot: &QuestionSnapshot) -> DeliveredQuestion {
    DeliveredQuestion {
        content: snapshot.content.clone(),
        image_url: snapshot.image_url.clone(),
        audio_url: snapshot.audio_url.clone(),
        options: snapshot
            .options
            .iter()
            .map(|option| DeliveredOption {
                label: option.label.clone(),
                content: option.content.clone(),
            })
            .collect(),
    }
}

fn deliver_group(snapshot: &GroupSnapshot) -> DeliveredGroup {
    DeliveredGroup {
        passage: snapshot.passage.clone(),
        image_url: snapshot.image_url.clone(),
        audio_url: snapshot.audio_url.clone(),
        questions: snapshot.questions.iter().map(deliver_question).collect(),
    }
}

impl From<&TestQuestionSnapshot> for DeliveredSnapshot {
    fn from(snapshot: &TestQuestionSnapshot) -> Self {
        match snapshot {
            TestQuestionSnapshot::Single(question) => {
                DeliveredSnapshot::Single(deliver_question(question))
            }
            TestQuestionSnapshot::Group(group) => DeliveredSnapshot::Group(deliver_group(group)),
        }
    }
}

pub(crate) fn test_to_response(test: Test, question_count: usize) -> TestResponse {
    TestResponse {
        id: test.id,
        title: test.title,
        description: test.description,
        skill: test.skill,
        test_type: test.test_type,
        duration_minutes: test.duration_minutes,
        status: test.status,
        parent_test_id: test.parent_test_id,
        question_count,
        created_at: format_primitive(test.created_at),
        published_at: test.published_at.map(format_primitive),
    }
}

pub(crate) fn test_to_detail(test: Test, questions: &[TestQuestion]) -> TestDetailResponse {
    let question_count =
        questions.iter().map(|question| question.snapshot.0.question_count()).sum();
    TestDetailResponse {
        test: test_to_response(test, question_count),
        questions: questions
            .iter()
            .map(|question| TestQuestionView {
                id: question.id.clone(),
                part_id: question.part_id,
                order_in_test: question.order_in_test,
                snapshot: DeliveredSnapshot::from(&question.snapshot.0),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::snapshot::OptionSnapshot;

    #[test]
    fn delivered_snapshot_strips_answer_key() {
        let snapshot = TestQuestionSnapshot::Single(QuestionSnapshot {
            content: Some("stem".to_string()),
            image_url: None,
            audio_url: None,
            explanation: Some("because".to_string()),
            options: vec![OptionSnapshot {
                label: "A".to_string(),
                content: "choice".to_string(),
                is_correct: true,
            }],
        });

        let delivered = DeliveredSnapshot::from(&snapshot);
        let json = serde_json::to_value(&delivered).expect("serialize");

        assert_eq!(json["kind"], "single");
        assert!(json.get("explanation").is_none());
        assert!(json["options"][0].get("is_correct").is_none());
        assert_eq!(json["options"][0]["label"], "A");
    }
}
