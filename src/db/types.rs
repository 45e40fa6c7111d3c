use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "testskill", rename_all = "lowercase")]
pub(crate) enum TestSkill {
    Lr,
    Writing,
    Speaking,
    FourSkills,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "testtype", rename_all = "lowercase")]
pub(crate) enum TestType {
    Simulator,
    Practice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "teststatus", rename_all = "lowercase")]
pub(crate) enum TestStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "testresultstatus", rename_all = "lowercase")]
pub(crate) enum TestResultStatus {
    InProgress,
    Graded,
    PendingManualGrading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "aiscorer", rename_all = "lowercase")]
pub(crate) enum AiScorer {
    Writing,
    Speaking,
}

/// Skill axis used for per-skill score rows; Listening and Reading are
/// reported separately even though they are delivered as one LR test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "scoredskill", rename_all = "lowercase")]
pub(crate) enum ScoredSkill {
    Listening,
    Reading,
    Writing,
    Speaking,
}

/// TOEIC part numbering is fixed: 1-4 Listening, 5-7 Reading,
/// 8-10 Writing, 11-15 Speaking.
pub(crate) const LISTENING_PART_MAX: i32 = 4;
pub(crate) const READING_PART_MAX: i32 = 7;
pub(crate) const WRITING_PART_MAX: i32 = 10;
pub(crate) const SPEAKING_PART_MAX: i32 = 15;

pub(crate) fn part_skill(part_id: i32) -> Option<TestSkill> {
    match part_id {
        1..=READING_PART_MAX => Some(TestSkill::Lr),
        8..=WRITING_PART_MAX => Some(TestSkill::Writing),
        11..=SPEAKING_PART_MAX => Some(TestSkill::Speaking),
        _ => None,
    }
}

pub(crate) fn is_listening_part(part_id: i32) -> bool {
    (1..=LISTENING_PART_MAX).contains(&part_id)
}

pub(crate) fn is_reading_part(part_id: i32) -> bool {
    ((LISTENING_PART_MAX + 1)..=READING_PART_MAX).contains(&part_id)
}

pub(crate) fn is_lr_part(part_id: i32) -> bool {
    (1..=READING_PART_MAX).contains(&part_id)
}
