use thiserror::Error;

use crate::db::models::{Question, QuestionGroup, QuestionOption};
use crate::db::snapshot::{GroupSnapshot, OptionSnapshot, QuestionSnapshot, TestQuestionSnapshot};
use crate::db::types::{part_skill, TestSkill};

pub(crate) const LR_QUESTION_TOTAL: usize = 200;
pub(crate) const SPEAKING_QUESTION_TOTAL: usize = 11;
pub(crate) const WRITING_QUESTION_TOTAL: usize = 8;
pub(crate) const MIN_GROUP_QUESTIONS: usize = 2;
pub(crate) const MAX_GROUP_QUESTIONS: usize = 5;
/// Part 2 is the only LR part delivered with three options.
pub(crate) const PART_2_OPTION_COUNT: usize = 3;
pub(crate) const LR_OPTION_COUNT: usize = 4;

/// Assembly-time content for one part, either typed in manually or resolved
/// from the question bank. This is the unit `validate_test_structure` and
/// the snapshot builder operate on.
#[derive(Debug, Clone)]
pub(crate) struct PartContent {
    pub(crate) part_id: i32,
    pub(crate) questions: Vec<QuestionContent>,
    pub(crate) groups: Vec<GroupContent>,
}

#[derive(Debug, Clone)]
pub(crate) struct QuestionContent {
    pub(crate) content: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) explanation: Option<String>,
    pub(crate) options: Vec<OptionContent>,
    pub(crate) source_question_id: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct OptionContent {
    pub(crate) label: String,
    pub(crate) content: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct GroupContent {
    pub(crate) passage: Option<String>,
    pub(crate) image_url: Option<String>,
    pub(crate) audio_url: Option<String>,
    pub(crate) questions: Vec<QuestionContent>,
    pub(crate) source_group_id: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum AssemblyError {
    #[error("at least one part is required")]
    EmptyTest,
    #[error("part {0} does not exist")]
    UnknownPart(i32),
    #[error("part {part_id} does not belong to a {skill:?} test")]
    PartSkillMismatch { part_id: i32, skill: TestSkill },
    #[error("{skill:?} test must have exactly {expected} questions, found {actual}")]
    WrongTotal { skill: TestSkill, expected: usize, actual: usize },
    #[error(
        "group in part {part_id} must have {MIN_GROUP_QUESTIONS}-{MAX_GROUP_QUESTIONS} questions, found {actual}"
    )]
    GroupSize { part_id: i32, actual: usize },
    #[error("question in part {part_id} must have exactly {expected} options, found {actual}")]
    OptionCount { part_id: i32, expected: usize, actual: usize },
}

/// Structural gate run before anything is persisted. A failure aborts the
/// whole assembly; partial tests are never written.
pub(crate) fn validate_test_structure(
    skill: TestSkill,
    parts: &[PartContent],
) -> Result<(), AssemblyError> {
    if parts.is_empty() {
        return Err(AssemblyError::EmptyTest);
    }

    let mut lr_total = 0usize;
    let mut writing_total = 0usize;
    let mut speaking_total = 0usize;

    for part in parts {
        let part_owner =
            part_skill(part.part_id).ok_or(AssemblyError::UnknownPart(part.part_id))?;

        let allowed = match skill {
            TestSkill::FourSkills => true,
            other => part_owner == other,
        };
        if !allowed {
            return Err(AssemblyError::PartSkillMismatch { part_id: part.part_id, skill });
        }

        let part_questions = part.questions.len()
            + part.groups.iter().map(|group| group.questions.len()).sum::<usize>();
        match part_owner {
            TestSkill::Lr => lr_total += part_questions,
            TestSkill::Writing => writing_total += part_questions,
            TestSkill::Speaking => speaking_total += part_questions,
            TestSkill::FourSkills => {}
        }

        if part_owner != TestSkill::Lr {
            continue;
        }

        for group in &part.groups {
            if !(MIN_GROUP_QUESTIONS..=MAX_GROUP_QUESTIONS).contains(&group.questions.len()) {
                return Err(AssemblyError::GroupSize {
                    part_id: part.part_id,
                    actual: group.questions.len(),
                });
            }
        }

        let expected_options =
            if part.part_id == 2 { PART_2_OPTION_COUNT } else { LR_OPTION_COUNT };
        for question in
            part.questions.iter().chain(part.groups.iter().flat_map(|group| &group.questions))
        {
            if question.options.len() != expected_options {
                return Err(AssemblyError::OptionCount {
                    part_id: part.part_id,
                    expected: expected_options,
                    actual: question.options.len(),
                });
            }
        }
    }

    let check_total = |skill: TestSkill, expected: usize, actual: usize| {
        if actual != expected {
            Err(AssemblyError::WrongTotal { skill, expected, actual })
        } else {
            Ok(())
        }
    };

    match skill {
        TestSkill::Lr => check_total(TestSkill::Lr, LR_QUESTION_TOTAL, lr_total),
        TestSkill::Writing => check_total(TestSkill::Writing, WRITING_QUESTION_TOTAL, writing_total),
        TestSkill::Speaking => {
            check_total(TestSkill::Speaking, SPEAKING_QUESTION_TOTAL, speaking_total)
        }
        TestSkill::FourSkills => {
            check_total(TestSkill::Lr, LR_QUESTION_TOTAL, lr_total)?;
            check_total(TestSkill::Writing, WRITING_QUESTION_TOTAL, writing_total)?;
            check_total(TestSkill::Speaking, SPEAKING_QUESTION_TOTAL, speaking_total)
        }
    }
}

/// Freeze a question into a snapshot value. From this point on the bank row
/// can change freely without touching the delivered test.
pub(crate) fn snapshot_question(question: &QuestionContent) -> QuestionSnapshot {
    QuestionSnapshot {
        content: question.content.clone(),
        image_url: question.image_url.clone(),
        audio_url: question.audio_url.clone(),
        explanation: question.explanation.clone(),
        options: question
            .options
            .iter()
            .map(|option| OptionSnapshot {
                label: option.label.clone(),
                content: option.content.clone(),
                is_correct: option.is_correct,
            })
            .collect(),
    }
}

pub(crate) fn snapshot_group(group: &GroupContent) -> GroupSnapshot {
    GroupSnapshot {
        passage: group.passage.clone(),
        image_url: group.image_url.clone(),
        audio_url: group.audio_url.clone(),
        questions: group.questions.iter().map(snapshot_question).collect(),
    }
}

pub(crate) fn single_snapshot(question: &QuestionContent) -> TestQuestionSnapshot {
    TestQuestionSnapshot::Single(snapshot_question(question))
}

pub(crate) fn group_snapshot(group: &GroupContent) -> TestQuestionSnapshot {
    TestQuestionSnapshot::Group(snapshot_group(group))
}

/// Resolve a bank question row plus its options into assembly content.
pub(crate) fn question_content_from_bank(
    question: &Question,
    options: &[QuestionOption],
) -> QuestionContent {
    QuestionContent {
        content: question.content.clone(),
        image_url: question.image_url.clone(),
        audio_url: question.audio_url.clone(),
        explanation: question.explanation.clone(),
        options: options
            .iter()
            .filter(|option| option.question_id == question.id)
            .map(|option| OptionContent {
                label: option.label.clone(),
                content: option.content.clone(),
                is_correct: option.is_correct,
            })
            .collect(),
        source_question_id: Some(question.id.clone()),
    }
}

pub(crate) fn group_content_from_bank(
    group: &QuestionGroup,
    members: Vec<QuestionContent>,
) -> GroupContent {
    GroupContent {
        passage: group.passage.clone(),
        image_url: group.image_url.clone(),
        audio_url: group.audio_url.clone(),
        questions: members,
        source_group_id: Some(group.id.clone()),
    }
}
