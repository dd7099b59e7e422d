// src/db/score.rs

use std::collections::BTreeMap;

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::exam_mode::ExamMode;
use crate::models::score::{
    CategoryScore, CategoryStat, LeaderboardEntry, NewScore, ProgressPoint, Score, UserStats,
};
use crate::quiz::percentage;

const SCORE_COLUMNS: &str = "id, user_id, exam_mode, score, total_questions, correct_answers, \
                             time_spent, category_scores, created_at";

/// Appends an attempt to the ledger. Rows are immutable once written.
pub async fn save(pool: &SqlitePool, new: &NewScore) -> Result<Score, AppError> {
    if !new.exam_mode.is_official() {
        return Err(AppError::Validation(format!(
            "Exam mode '{}' is not eligible for the scoreboard",
            new.exam_mode
        )));
    }
    if !(0..=100).contains(&new.score) {
        return Err(AppError::Validation(
            "Score must be between 0 and 100".to_string(),
        ));
    }

    let category_scores = serde_json::to_string(&new.category_scores)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let created_at = Utc::now();

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO scores
            (user_id, exam_mode, score, total_questions, correct_answers,
             time_spent, category_scores, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&new.user_id)
    .bind(new.exam_mode)
    .bind(new.score)
    .bind(new.total_questions)
    .bind(new.correct_answers)
    .bind(new.time_spent)
    .bind(&category_scores)
    .bind(created_at)
    .fetch_one(pool)
    .await?;

    Ok(Score {
        id,
        user_id: new.user_id.clone(),
        exam_mode: new.exam_mode,
        score: new.score,
        total_questions: new.total_questions,
        correct_answers: new.correct_answers,
        time_spent: new.time_spent,
        category_scores,
        created_at,
    })
}

/// Best attempt per user in a mode (score first, then lower time), annotated
/// with that user's attempt count in the mode.
pub async fn leaderboard(
    pool: &SqlitePool,
    mode: ExamMode,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, AppError> {
    if !mode.is_official() {
        return Err(AppError::Validation(format!(
            "Exam mode '{mode}' has no leaderboard"
        )));
    }

    let entries = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT
            s.id, s.user_id, u.name AS user_name, u.image AS user_image,
            s.score, s.total_questions, s.correct_answers, s.time_spent, s.created_at,
            (SELECT COUNT(*) FROM scores s3
             WHERE s3.user_id = s.user_id AND s3.exam_mode = s.exam_mode) AS attempt_count
        FROM scores s
        JOIN users u ON s.user_id = u.id
        WHERE s.exam_mode = ?1
          AND s.id = (
            SELECT s2.id FROM scores s2
            WHERE s2.user_id = s.user_id AND s2.exam_mode = s.exam_mode
            ORDER BY s2.score DESC, s2.time_spent ASC
            LIMIT 1
          )
        ORDER BY s.score DESC, s.time_spent ASC
        LIMIT ?2
        "#,
    )
    .bind(mode)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// A user's attempts, newest first, optionally restricted to one mode.
pub async fn user_scores(
    pool: &SqlitePool,
    user_id: &str,
    mode: Option<ExamMode>,
) -> Result<Vec<Score>, AppError> {
    let scores = match mode {
        Some(mode) => {
            sqlx::query_as::<_, Score>(&format!(
                "SELECT {SCORE_COLUMNS} FROM scores WHERE user_id = ? AND exam_mode = ? \
                 ORDER BY created_at DESC, id DESC"
            ))
            .bind(user_id)
            .bind(mode)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Score>(&format!(
                "SELECT {SCORE_COLUMNS} FROM scores WHERE user_id = ? \
                 ORDER BY created_at DESC, id DESC"
            ))
            .bind(user_id)
            .fetch_all(pool)
            .await?
        }
    };

    Ok(scores)
}

/// Aggregates a user's whole history: best score per mode, rounded mean,
/// per-category totals (raw counts summed before the percentage is taken),
/// per-mode progression and the 10 most recent attempts.
pub async fn user_stats(pool: &SqlitePool, user_id: &str) -> Result<UserStats, AppError> {
    let all = sqlx::query_as::<_, Score>(&format!(
        "SELECT {SCORE_COLUMNS} FROM scores WHERE user_id = ? ORDER BY created_at ASC, id ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let total_attempts = all.len() as i64;
    let mut best_scores: BTreeMap<String, i64> = BTreeMap::new();
    let mut progression: BTreeMap<String, Vec<ProgressPoint>> = BTreeMap::new();
    let mut category_stats: BTreeMap<String, CategoryStat> = BTreeMap::new();
    let mut score_sum = 0i64;

    for score in &all {
        score_sum += score.score;

        let mode = score.exam_mode.to_string();
        let best = best_scores.entry(mode.clone()).or_insert(score.score);
        if score.score > *best {
            *best = score.score;
        }
        progression.entry(mode).or_default().push(ProgressPoint {
            date: score.created_at,
            score: score.score,
        });

        // A malformed blob invalidates that row's contribution only.
        match serde_json::from_str::<BTreeMap<String, CategoryScore>>(&score.category_scores) {
            Ok(categories) => {
                for (category, data) in categories {
                    let entry = category_stats.entry(category).or_default();
                    entry.correct += data.correct;
                    entry.total += data.total;
                }
            }
            Err(err) => {
                tracing::warn!(score_id = score.id, "skipping malformed category_scores: {err}");
            }
        }
    }

    for stat in category_stats.values_mut() {
        stat.percentage = percentage(stat.correct, stat.total);
    }

    let avg_score = if total_attempts == 0 {
        0
    } else {
        (score_sum as f64 / total_attempts as f64).round() as i64
    };

    let recent_attempts: Vec<Score> = all.iter().rev().take(10).cloned().collect();

    Ok(UserStats {
        total_attempts,
        best_scores,
        avg_score,
        category_stats,
        progression,
        recent_attempts,
    })
}
