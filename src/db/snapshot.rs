use serde::{Deserialize, Serialize};

/// Frozen copy of one answer option at assembly time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct OptionSnapshot {
    pub(crate) label: String,
    pub(crate) content: String,
    pub(crate) is_correct: bool,
}

/// Frozen copy of a single bank question. Edits to the live bank row never
/// reach a snapshot; only the explicit refresh-snapshot action rebuilds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct QuestionSnapshot {
    pub(crate) content: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) explanation: Option<String>,
    #[serde(default)]
    pub(crate) options: Vec<OptionSnapshot>,
}

/// Frozen copy of a question group (shared passage plus its questions,
/// in delivery order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct GroupSnapshot {
    pub(crate) passage: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) questions: Vec<QuestionSnapshot>,
}

/// The snapshot column of a delivered test question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub(crate) enum TestQuestionSnapshot {
    Single(QuestionSnapshot),
    Group(GroupSnapshot),
}

impl QuestionSnapshot {
    pub(crate) fn correct_label(&self) -> Option<&str> {
        self.options.iter().find(|option| option.is_correct).map(|option| option.label.as_str())
    }
}

impl TestQuestionSnapshot {
    /// Number of gradable units this snapshot delivers.
    pub(crate) fn question_count(&self) -> usize {
        match self {
            TestQuestionSnapshot::Single(_) => 1,
            TestQuestionSnapshot::Group(group) => group.questions.len(),
        }
    }

    /// The answer key for the sub-question at `index` (always 0 for singles).
    pub(crate) fn correct_label(&self, index: usize) -> Option<&str> {
        match self {
            TestQuestionSnapshot::Single(question) if index == 0 => question.correct_label(),
            TestQuestionSnapshot::Single(_) => None,
            TestQuestionSnapshot::Group(group) => {
                group.questions.get(index).and_then(QuestionSnapshot::correct_label)
            }
        }
    }

    pub(crate) fn question(&self, index: usize) -> Option<&QuestionSnapshot> {
        match self {
            TestQuestionSnapshot::Single(question) if index == 0 => Some(question),
            TestQuestionSnapshot::Single(_) => None,
            TestQuestionSnapshot::Group(group) => group.questions.get(index),
        }
    }

    pub(crate) fn passage(&self) -> Option<&str> {
        match self {
            TestQuestionSnapshot::Single(_) => None,
            TestQuestionSnapshot::Group(group) => group.passage.as_deref(),
        }
    }
}
