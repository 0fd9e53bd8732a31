use crate::models::answer::Answer;
use crate::models::test::Question;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub correct_count: i32,
    /// 0..=100, round-half-up.
    pub percentage: i32,
    pub passed: bool,
}

/// Scores an answer snapshot against the full, order-sorted question list.
///
/// Pure: identical inputs always produce identical outputs, so it serves
/// both finalization and score previews. A question counts as correct iff
/// an answer exists at its index and the selected option equals the
/// question's correct option; unanswered entries never count.
pub fn score(answers: &[Answer], questions: &[Question], passing_score: i32) -> ScoreOutcome {
    if questions.is_empty() {
        return ScoreOutcome {
            correct_count: 0,
            percentage: 0,
            passed: false,
        };
    }

    let mut correct_count = 0;
    for (index, question) in questions.iter().enumerate() {
        let answer = answers
            .iter()
            .find(|a| a.question_index as usize == index);
        if let Some(answer) = answer {
            if answer.is_answered() && answer.selected_option == question.correct_option_index {
                correct_count += 1;
            }
        }
    }

    let percentage = ((correct_count as f64 / questions.len() as f64) * 100.0).round() as i32;

    ScoreOutcome {
        correct_count,
        percentage,
        passed: percentage >= passing_score,
    }
}
