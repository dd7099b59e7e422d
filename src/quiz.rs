// src/quiz.rs
//
// The quiz composer and the scoring engine. Both are pure: no persistence,
// no shared state, randomness injected so tests can seed it.

use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::question::QuestionWithAnswers;
use crate::models::score::{CategoryScore, QuizAnswer, QuizResult};

/// Composes a quiz: filters the catalog by category name (empty list keeps
/// everything), draws a uniform random subset of at most `count` questions,
/// then independently shuffles each question's answer options.
///
/// A pool smaller than `count` yields fewer questions, never an error.
pub fn compose<R: Rng>(
    questions: Vec<QuestionWithAnswers>,
    count: usize,
    categories: &[String],
    rng: &mut R,
) -> Vec<QuestionWithAnswers> {
    let mut filtered: Vec<QuestionWithAnswers> = if categories.is_empty() {
        questions
    } else {
        questions
            .into_iter()
            .filter(|q| categories.iter().any(|c| c == &q.category_name))
            .collect()
    };

    filtered.shuffle(rng);
    filtered.truncate(count);

    for question in &mut filtered {
        question.answer_options.shuffle(rng);
    }

    filtered
}

/// Scores a completed attempt against the presented question sequence.
///
/// `answers` is index-aligned with `questions`; a missing answer at an index
/// counts as unanswered. Categories with no presented question are absent
/// from the breakdown rather than zero-valued.
pub fn calculate_result(
    questions: &[QuestionWithAnswers],
    answers: &[QuizAnswer],
    time_spent: i64,
) -> QuizResult {
    let mut category_scores: BTreeMap<String, CategoryScore> = BTreeMap::new();
    let mut correct_answers = 0i64;

    for (index, question) in questions.iter().enumerate() {
        let entry = category_scores
            .entry(question.category_name.clone())
            .or_default();
        entry.total += 1;

        if answers.get(index).is_some_and(|a| a.is_correct) {
            correct_answers += 1;
            entry.correct += 1;
        }
    }

    QuizResult {
        score: percentage(correct_answers, questions.len() as i64),
        total_questions: questions.len() as i64,
        correct_answers,
        time_spent,
        category_scores,
    }
}

/// Integer percentage rounded half-up; 0 when the denominator is 0.
pub fn percentage(correct: i64, total: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as i64
}
