// src/db/dashboard.rs
//
// Fleet-wide aggregates for the admin dashboard, derived from the attempt
// ledger and the questions' cumulative outcome counters.

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::exam_mode::ExamMode;
use crate::quiz::percentage;

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct EntityCounts {
    pub questions: i64,
    pub categories: i64,
    pub users: i64,
}

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct DailyAttempts {
    pub day: String,
    pub attempts: i64,
}

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct DailyModeAverage {
    pub day: String,
    pub exam_mode: ExamMode,
    pub avg_score: i64,
}

#[derive(Debug, Serialize)]
pub struct CategorySuccess {
    pub category: String,
    pub successes: i64,
    pub failures: i64,
    pub success_rate: i64,
}

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct QuestionOutcome {
    pub id: i64,
    pub question_text: String,
    pub category_name: String,
    pub success_count: i64,
    pub failure_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub counts: EntityCounts,
    pub daily_attempts: Vec<DailyAttempts>,
    pub daily_mode_averages: Vec<DailyModeAverage>,
    pub category_success: Vec<CategorySuccess>,
    pub easiest_questions: Vec<QuestionOutcome>,
    pub hardest_questions: Vec<QuestionOutcome>,
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryCounters {
    category: String,
    successes: i64,
    failures: i64,
}

const OUTCOME_EXTREMES_SQL: &str = "
    SELECT q.id, q.question_text, c.name AS category_name,
           q.success_count, q.failure_count
    FROM questions q
    JOIN categories c ON c.id = q.category_id
    WHERE q.success_count + q.failure_count > 0";

pub async fn collect(pool: &SqlitePool) -> Result<Dashboard, AppError> {
    let cutoff = Utc::now() - Duration::days(30);

    let counts = sqlx::query_as::<_, EntityCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM questions)  AS questions,
            (SELECT COUNT(*) FROM categories) AS categories,
            (SELECT COUNT(*) FROM users)      AS users
        "#,
    )
    .fetch_one(pool)
    .await?;

    let daily_attempts = sqlx::query_as::<_, DailyAttempts>(
        r#"
        SELECT date(created_at) AS day, COUNT(*) AS attempts
        FROM scores
        WHERE created_at >= ?
        GROUP BY day
        ORDER BY day
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    let daily_mode_averages = sqlx::query_as::<_, DailyModeAverage>(
        r#"
        SELECT date(created_at) AS day, exam_mode,
               CAST(ROUND(AVG(score)) AS INTEGER) AS avg_score
        FROM scores
        WHERE created_at >= ?
        GROUP BY day, exam_mode
        ORDER BY day, exam_mode
        "#,
    )
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    // Success rates come from the questions' lifetime counters, not score rows.
    let category_success = sqlx::query_as::<_, CategoryCounters>(
        r#"
        SELECT c.name AS category,
               COALESCE(SUM(q.success_count), 0) AS successes,
               COALESCE(SUM(q.failure_count), 0) AS failures
        FROM categories c
        JOIN questions q ON q.category_id = c.id
        GROUP BY c.id, c.name
        ORDER BY c.name
        "#,
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| CategorySuccess {
        success_rate: percentage(row.successes, row.successes + row.failures),
        category: row.category,
        successes: row.successes,
        failures: row.failures,
    })
    .collect();

    let easiest_questions = sqlx::query_as::<_, QuestionOutcome>(&format!(
        "{OUTCOME_EXTREMES_SQL}
        ORDER BY CAST(q.success_count AS REAL) / (q.success_count + q.failure_count) DESC,
                 q.success_count + q.failure_count DESC
        LIMIT 3"
    ))
    .fetch_all(pool)
    .await?;

    let hardest_questions = sqlx::query_as::<_, QuestionOutcome>(&format!(
        "{OUTCOME_EXTREMES_SQL}
        ORDER BY CAST(q.success_count AS REAL) / (q.success_count + q.failure_count) ASC,
                 q.success_count + q.failure_count DESC
        LIMIT 3"
    ))
    .fetch_all(pool)
    .await?;

    Ok(Dashboard {
        counts,
        daily_attempts,
        daily_mode_averages,
        category_success,
        easiest_questions,
        hardest_questions,
    })
}
