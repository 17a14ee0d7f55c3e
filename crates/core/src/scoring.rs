//! Scoring and review reports for completed quiz sessions.

use serde::{Deserialize, Serialize};

use crate::model::{OptionIndex, Question, QuestionId};

/// Scored outcome of a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    score: u32,
    total: u32,
    percentage: u8,
    per_question_correct: Vec<bool>,
}

impl QuizResult {
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Score as a whole percentage, rounded half-up.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub fn per_question_correct(&self) -> &[bool] {
        &self.per_question_correct
    }
}

/// Rounds `100 * score / total` half-up using integer arithmetic only.
///
/// Returns 0 when `total` is 0.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let score = u64::from(score.min(total));
    let total = u64::from(total);
    let rounded = (200 * score + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

/// Scores `answers` against `questions`, position by position.
///
/// Unset answers, and answers missing past the end of the slice, count as incorrect.
#[must_use]
pub fn score(questions: &[Question], answers: &[Option<OptionIndex>]) -> QuizResult {
    let per_question_correct: Vec<bool> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| q.is_correct(answers.get(i).copied().flatten()))
        .collect();

    let score = per_question_correct.iter().filter(|c| **c).count();
    let score = u32::try_from(score).unwrap_or(u32::MAX);
    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);

    QuizResult {
        score,
        total,
        percentage: percentage(score, total),
        per_question_correct,
    }
}

//
// ─── REVIEW REPORT ─────────────────────────────────────────────────────────────
//

/// One row of the post-quiz breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub question_id: QuestionId,
    pub prompt: String,
    pub correct_option: OptionIndex,
    pub correct_text: String,
    pub selected: Option<OptionIndex>,
    pub selected_text: Option<String>,
    pub is_correct: bool,
}

/// Per-question breakdown in question order, together with the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub result: QuizResult,
    pub items: Vec<ReviewItem>,
}

impl ReviewReport {
    #[must_use]
    pub fn build(questions: &[Question], answers: &[Option<OptionIndex>]) -> Self {
        let result = score(questions, answers);
        let items = questions
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let selected = answers.get(i).copied().flatten();
                ReviewItem {
                    question_id: q.id().clone(),
                    prompt: q.prompt().to_owned(),
                    correct_option: q.correct_option(),
                    correct_text: q.correct_text().to_owned(),
                    selected,
                    selected_text: selected.map(|s| q.option(s).to_owned()),
                    is_correct: result.per_question_correct[i],
                }
            })
            .collect();

        Self { result, items }
    }

    /// Items the player got wrong or left unanswered.
    pub fn missed(&self) -> impl Iterator<Item = &ReviewItem> {
        self.items.iter().filter(|item| !item.is_correct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: usize, correct: usize) -> Question {
        Question::new(
            QuestionId::new(format!("q{id}")),
            format!("Question {id}"),
            ["A", "B", "C", "D"].map(String::from),
            correct,
        )
        .unwrap()
    }

    fn opt(i: usize) -> Option<OptionIndex> {
        Some(OptionIndex::new(i).unwrap())
    }

    #[test]
    fn mixed_answers_score_three_of_five() {
        let questions: Vec<_> = (0..5).map(|i| question(i, i % 4)).collect();
        // correct, correct, wrong, unset, correct
        let answers = vec![opt(0), opt(1), opt(3), None, opt(0)];
        let result = score(&questions, &answers);
        assert_eq!(result.score(), 3);
        assert_eq!(result.total(), 5);
        assert_eq!(result.percentage(), 60);
        assert_eq!(
            result.per_question_correct(),
            &[true, true, false, false, true]
        );
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn all_unanswered_is_zero() {
        let questions: Vec<_> = (0..3).map(|i| question(i, 0)).collect();
        let result = score(&questions, &[None, None, None]);
        assert_eq!(result.score(), 0);
        assert_eq!(result.percentage(), 0);
    }

    #[test]
    fn short_answer_slice_counts_missing_as_wrong() {
        let questions: Vec<_> = (0..2).map(|i| question(i, 0)).collect();
        let result = score(&questions, &[opt(0)]);
        assert_eq!(result.per_question_correct(), &[true, false]);
    }

    #[test]
    fn review_report_lists_selected_and_correct_text() {
        let questions = vec![question(0, 2), question(1, 1)];
        let report = ReviewReport::build(&questions, &[opt(2), None]);
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.items[0].correct_text, "C");
        assert_eq!(report.items[0].selected_text.as_deref(), Some("C"));
        assert!(report.items[0].is_correct);
        assert_eq!(report.items[1].selected, None);
        assert_eq!(report.missed().count(), 1);
        assert_eq!(report.result.score(), 1);
    }
}
