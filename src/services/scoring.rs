use std::collections::HashMap;

use crate::db::models::TestQuestion;
use crate::db::types::{is_listening_part, is_lr_part, is_reading_part, TestSkill};

/// Official TOEIC Listening conversion table: raw correct count (0-100) to
/// the reported scaled score. Reproduced as published; never derived.
const LISTENING_SCALE: [i32; 101] = [
    5, 15, 25, 30, 35, 40, 45, 50, 55, 60, 65, 70, 75, 80, 85, 90, 95, 100, 105, 110, 115, 120,
    125, 130, 135, 140, 145, 150, 155, 160, 165, 170, 175, 180, 185, 190, 195, 200, 205, 210, 215,
    220, 225, 230, 235, 240, 245, 250, 255, 260, 265, 270, 275, 280, 285, 290, 295, 300, 305, 310,
    315, 320, 325, 330, 335, 340, 345, 350, 355, 360, 365, 370, 375, 380, 385, 390, 395, 400, 405,
    410, 415, 420, 425, 430, 435, 440, 445, 450, 455, 460, 465, 470, 475, 480, 485, 490, 495, 495,
    495, 495, 495,
];

/// Official TOEIC Reading conversion table, same shape as the listening one.
const READING_SCALE: [i32; 101] = [
    5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60, 65, 70, 75, 80, 85, 90, 95, 100, 105, 110, 115,
    120, 125, 130, 135, 140, 145, 150, 155, 160, 165, 170, 175, 180, 185, 190, 195, 200, 205, 210,
    215, 220, 225, 230, 235, 240, 245, 250, 255, 260, 265, 270, 275, 280, 285, 290, 295, 300, 305,
    310, 315, 320, 325, 330, 335, 340, 345, 350, 355, 360, 365, 370, 375, 380, 385, 390, 395, 400,
    405, 410, 415, 420, 425, 430, 435, 440, 445, 450, 455, 460, 465, 470, 475, 480, 485, 490, 495,
    495, 495,
];

/// Writing/Speaking band table: averaged AI score (0-100) to the reported
/// 0-200 scale in 10-point steps. First band whose floor the average
/// reaches wins.
const SW_SCALE: [(f64, i32); 21] = [
    (100.0, 200),
    (95.0, 190),
    (90.0, 180),
    (85.0, 170),
    (80.0, 160),
    (75.0, 150),
    (70.0, 140),
    (65.0, 130),
    (60.0, 120),
    (55.0, 110),
    (50.0, 100),
    (45.0, 90),
    (40.0, 80),
    (35.0, 70),
    (30.0, 60),
    (25.0, 50),
    (20.0, 40),
    (15.0, 30),
    (10.0, 20),
    (5.0, 10),
    (0.0, 0),
];

pub(crate) const WRITING_PART_COUNT: usize = 3;
pub(crate) const SPEAKING_PART_COUNT: usize = 5;

pub(crate) fn scaled_listening(raw_correct: i32) -> i32 {
    LISTENING_SCALE[raw_correct.clamp(0, 100) as usize]
}

pub(crate) fn scaled_reading(raw_correct: i32) -> i32 {
    READING_SCALE[raw_correct.clamp(0, 100) as usize]
}

pub(crate) fn scaled_sw(average: f64) -> i32 {
    let average = average.clamp(0.0, 100.0);
    SW_SCALE
        .iter()
        .find(|(floor, _)| average >= *floor)
        .map(|(_, scaled)| *scaled)
        .unwrap_or(0)
}

/// Per-question outcome counts for one graded LR attempt.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct LrTally {
    pub(crate) total_questions: i32,
    pub(crate) correct_count: i32,
    pub(crate) incorrect_count: i32,
    pub(crate) skip_count: i32,
    pub(crate) listening_correct: i32,
    pub(crate) listening_total: i32,
    pub(crate) reading_correct: i32,
    pub(crate) reading_total: i32,
}

impl LrTally {
    pub(crate) fn listening_score(&self) -> i32 {
        scaled_listening(self.listening_correct)
    }

    pub(crate) fn reading_score(&self) -> i32 {
        scaled_reading(self.reading_correct)
    }

    pub(crate) fn total_score(&self) -> i32 {
        self.listening_score() + self.reading_score()
    }
}

/// Answers keyed by (test_question_id, sub_question_index).
pub(crate) type AnswerKey = (String, i32);

/// Grade an LR attempt against the frozen snapshots. Pure: the same
/// snapshots and answers always produce the same tally. Questions from
/// non-LR parts (FourSkills tests) are ignored here.
pub(crate) fn tally_lr(
    questions: &[TestQuestion],
    answers: &HashMap<AnswerKey, String>,
) -> LrTally {
    let mut tally = LrTally::default();

    for question in questions {
        if !is_lr_part(question.part_id) {
            continue;
        }

        let unit_count = question.snapshot.0.question_count();
        for index in 0..unit_count {
            tally.total_questions += 1;
            if is_listening_part(question.part_id) {
                tally.listening_total += 1;
            } else if is_reading_part(question.part_id) {
                tally.reading_total += 1;
            }

            let chosen = answers
                .get(&(question.id.clone(), index as i32))
                .map(String::as_str)
                .filter(|label| !label.is_empty());

            let Some(chosen) = chosen else {
                tally.skip_count += 1;
                continue;
            };

            let correct = question.snapshot.0.correct_label(index);
            if correct == Some(chosen) {
                tally.correct_count += 1;
                if is_listening_part(question.part_id) {
                    tally.listening_correct += 1;
                } else {
                    tally.reading_correct += 1;
                }
            } else {
                tally.incorrect_count += 1;
            }
        }
    }

    tally
}

/// Aggregate view of one Writing or Speaking skill after AI scoring.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SkillAggregate {
    pub(crate) skill: TestSkill,
    /// Arithmetic mean of the completed parts' raw AI scores (0-100).
    pub(crate) total_score: f64,
    pub(crate) completed_parts: usize,
    pub(crate) total_parts: usize,
    pub(crate) is_complete: bool,
    /// The mean mapped onto the reported 0-200 scale.
    pub(crate) scaled_score: i32,
}

pub(crate) fn expected_part_count(skill: TestSkill) -> usize {
    match skill {
        TestSkill::Writing => WRITING_PART_COUNT,
        TestSkill::Speaking => SPEAKING_PART_COUNT,
        TestSkill::Lr | TestSkill::FourSkills => 0,
    }
}

/// Mean-of-parts aggregation; `None` when no part of this skill was scored.
pub(crate) fn aggregate_skill(skill: TestSkill, part_scores: &[f64]) -> Option<SkillAggregate> {
    if part_scores.is_empty() {
        return None;
    }

    let total_parts = expected_part_count(skill);
    let mean = part_scores.iter().sum::<f64>() / part_scores.len() as f64;

    Some(SkillAggregate {
        skill,
        total_score: mean,
        completed_parts: part_scores.len(),
        total_parts,
        is_complete: part_scores.len() == total_parts,
        scaled_score: scaled_sw(mean),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::snapshot::{
        GroupSnapshot, OptionSnapshot, QuestionSnapshot, TestQuestionSnapshot,
    };
    use sqlx::types::Json;

    fn snapshot_question(correct: &str) -> QuestionSnapshot {
        let labels = ["A", "B", "C", "D"];
        QuestionSnapshot {
            content: Some("stem".to_string()),
            image_url: None,
            audio_url: None,
            explanation: None,
            options: labels
                .iter()
                .map(|label| OptionSnapshot {
                    label: label.to_string(),
                    content: format!("choice {label}"),
                    is_correct: *label == correct,
                })
                .collect(),
        }
    }

    fn single(id: &str, part_id: i32, correct: &str) -> TestQuestion {
        TestQuestion {
            id: id.to_string(),
            test_id: "test".to_string(),
            part_id,
            order_in_test: 0,
            source_question_id: None,
            source_group_id: None,
            snapshot: Json(TestQuestionSnapshot::Single(snapshot_question(correct))),
        }
    }

    fn group(id: &str, part_id: i32, correct: &[&str]) -> TestQuestion {
        TestQuestion {
            id: id.to_string(),
            test_id: "test".to_string(),
            part_id,
            order_in_test: 0,
            source_question_id: None,
            source_group_id: None,
            snapshot: Json(TestQuestionSnapshot::Group(GroupSnapshot {
                passage: Some("passage".to_string()),
                image_url: None,
                audio_url: None,
                questions: correct.iter().map(|label| snapshot_question(label)).collect(),
            })),
        }
    }

    fn answer(entries: &[(&str, i32, &str)]) -> HashMap<AnswerKey, String> {
        entries
            .iter()
            .map(|(id, index, label)| ((id.to_string(), *index), label.to_string()))
            .collect()
    }

    #[test]
    fn scale_tables_are_monotonic_and_bounded() {
        for raw in 0..100 {
            assert!(scaled_listening(raw) <= scaled_listening(raw + 1));
            assert!(scaled_reading(raw) <= scaled_reading(raw + 1));
        }
        assert_eq!(scaled_listening(0), 5);
        assert_eq!(scaled_listening(100), 495);
        assert_eq!(scaled_reading(0), 5);
        assert_eq!(scaled_reading(100), 495);
        assert_eq!(scaled_listening(-3), 5);
        assert_eq!(scaled_reading(200), 495);
    }

    #[test]
    fn sw_scale_maps_mean_to_bands() {
        assert_eq!(scaled_sw(0.0), 0);
        assert_eq!(scaled_sw(4.9), 0);
        assert_eq!(scaled_sw(70.0), 140);
        assert_eq!(scaled_sw(99.9), 190);
        assert_eq!(scaled_sw(100.0), 200);
    }

    #[test]
    fn tally_counts_correct_incorrect_and_skipped() {
        let questions = vec![
            single("q1", 1, "A"),
            single("q2", 5, "B"),
            group("g1", 7, &["C", "D", "A"]),
        ];
        let answers = answer(&[
            ("q1", 0, "A"),
            ("q2", 0, "C"),
            ("g1", 0, "C"),
            ("g1", 2, "B"),
        ]);

        let tally = tally_lr(&questions, &answers);

        assert_eq!(tally.total_questions, 5);
        assert_eq!(tally.correct_count, 2);
        assert_eq!(tally.incorrect_count, 2);
        assert_eq!(tally.skip_count, 1);
        assert_eq!(tally.listening_total, 1);
        assert_eq!(tally.listening_correct, 1);
        assert_eq!(tally.reading_total, 4);
        assert_eq!(tally.reading_correct, 1);
    }

    #[test]
    fn tally_ignores_non_lr_parts() {
        let questions = vec![single("q1", 1, "A"), single("w1", 8, "A")];
        let answers = answer(&[("q1", 0, "A"), ("w1", 0, "A")]);

        let tally = tally_lr(&questions, &answers);

        assert_eq!(tally.total_questions, 1);
        assert_eq!(tally.correct_count, 1);
    }

    #[test]
    fn tally_is_deterministic() {
        let questions = vec![single("q1", 2, "B"), group("g1", 3, &["A", "B"])];
        let answers = answer(&[("q1", 0, "B"), ("g1", 0, "A"), ("g1", 1, "C")]);

        let first = tally_lr(&questions, &answers);
        let second = tally_lr(&questions, &answers);

        assert_eq!(first, second);
    }

    #[test]
    fn partial_writing_aggregation() {
        let aggregate =
            aggregate_skill(TestSkill::Writing, &[80.0, 60.0]).expect("aggregate");

        assert_eq!(aggregate.total_score, 70.0);
        assert_eq!(aggregate.completed_parts, 2);
        assert_eq!(aggregate.total_parts, 3);
        assert!(!aggregate.is_complete);
        assert_eq!(aggregate.scaled_score, 140);
    }

    #[test]
    fn complete_speaking_aggregation() {
        let aggregate =
            aggregate_skill(TestSkill::Speaking, &[90.0, 90.0, 90.0, 90.0, 90.0])
                .expect("aggregate");

        assert!(aggregate.is_complete);
        assert_eq!(aggregate.completed_parts, 5);
        assert_eq!(aggregate.scaled_score, 180);
    }

    #[test]
    fn aggregate_skill_empty_is_none() {
        assert!(aggregate_skill(TestSkill::Writing, &[]).is_none());
    }
}
