// src/models/score.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::exam_mode::ExamMode;

/// Per-category tally inside one attempt or one aggregate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryScore {
    pub correct: i64,
    pub total: i64,
}

/// Represents the 'scores' table: one immutable row per completed attempt.
/// `category_scores` is the denormalized JSON breakdown, kept as stored.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Score {
    pub id: i64,
    pub user_id: String,
    pub exam_mode: ExamMode,
    pub score: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub time_spent: i64,
    pub category_scores: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A validated attempt ready for the ledger.
#[derive(Debug, Clone)]
pub struct NewScore {
    pub user_id: String,
    pub exam_mode: ExamMode,
    pub score: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub time_spent: i64,
    pub category_scores: BTreeMap<String, CategoryScore>,
}

/// One answer as recorded by the client during the attempt, positionally
/// aligned with the presented question sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAnswer {
    pub question_id: i64,
    pub selected_answer: String,
    pub is_correct: bool,
    /// Seconds spent on this question.
    pub time_spent: i64,
}

/// Output of the scoring engine.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    /// Normalized 0-100, rounded half-up.
    pub score: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub time_spent: i64,
    /// Covers exactly the categories present in the presented questions.
    pub category_scores: BTreeMap<String, CategoryScore>,
}

/// DTO for submitting a completed attempt. `question_ids` is the presented
/// order; `answers` is index-aligned and may be shorter (unanswered tail).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    pub exam_mode: ExamMode,
    pub time_spent: i64,
    pub question_ids: Vec<i64>,
    pub answers: Vec<QuizAnswer>,
}

/// Aggregated row for displaying the leaderboard: each user's single best
/// attempt in the mode, annotated with their total attempt count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub user_id: String,
    pub user_name: String,
    pub user_image: Option<String>,
    pub score: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub time_spent: i64,
    pub attempt_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Category aggregate across all of one user's attempts. Percentage is
/// computed from the summed raw counts, not from per-attempt percentages.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CategoryStat {
    pub correct: i64,
    pub total: i64,
    pub percentage: i64,
}

/// One point of a per-mode score-over-time series.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressPoint {
    pub date: chrono::DateTime<chrono::Utc>,
    pub score: i64,
}

/// Aggregate statistics for one user's history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_attempts: i64,
    /// Best score per official mode; modes never attempted are absent.
    pub best_scores: BTreeMap<String, i64>,
    pub avg_score: i64,
    pub category_stats: BTreeMap<String, CategoryStat>,
    pub progression: BTreeMap<String, Vec<ProgressPoint>>,
    /// The 10 most recent attempts, newest first.
    pub recent_attempts: Vec<Score>,
}
