// src/db/question.rs

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};

use crate::error::AppError;
use crate::models::question::{
    AnswerInput, AnswerOption, ImportQuestion, ImportReport, QuestionFilter, QuestionPage,
    QuestionSummary, QuestionWithAnswers,
};

use super::category;

/// Joined question header without its options.
#[derive(Debug, Clone, sqlx::FromRow)]
struct QuestionRow {
    id: i64,
    category_id: i64,
    category_name: String,
    question_text: String,
}

impl QuestionRow {
    fn with_options(self, answer_options: Vec<AnswerOption>) -> QuestionWithAnswers {
        QuestionWithAnswers {
            id: self.id,
            category_id: self.category_id,
            category_name: self.category_name,
            question_text: self.question_text,
            answer_options,
        }
    }
}

/// Paginated question listing for the admin table, newest first.
pub async fn list(pool: &SqlitePool, filter: &QuestionFilter) -> Result<QuestionPage, AppError> {
    let limit = filter.limit.unwrap_or(20).clamp(1, 100);
    let offset = filter.offset.unwrap_or(0).max(0);
    let search = filter.search.as_ref().map(|s| format!("%{s}%"));

    let questions = sqlx::query_as::<_, QuestionSummary>(
        r#"
        SELECT
            q.id, q.category_id, c.name AS category_name, q.question_text,
            q.success_count, q.failure_count,
            (SELECT COUNT(*) FROM answer_options ao WHERE ao.question_id = q.id) AS answer_count,
            q.created_at, q.updated_at
        FROM questions q
        JOIN categories c ON c.id = q.category_id
        WHERE (?1 IS NULL OR q.category_id = ?1)
          AND (?2 IS NULL OR q.question_text LIKE ?2)
        ORDER BY q.created_at DESC, q.id DESC
        LIMIT ?3 OFFSET ?4
        "#,
    )
    .bind(filter.category_id)
    .bind(&search)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM questions q
        WHERE (?1 IS NULL OR q.category_id = ?1)
          AND (?2 IS NULL OR q.question_text LIKE ?2)
        "#,
    )
    .bind(filter.category_id)
    .bind(&search)
    .fetch_one(pool)
    .await?;

    Ok(QuestionPage { questions, total })
}

/// One question with its options, ordered by position then id so insertion
/// order stays stable even when positions collide.
pub async fn get(pool: &SqlitePool, id: i64) -> Result<QuestionWithAnswers, AppError> {
    let row = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT q.id, q.category_id, c.name AS category_name, q.question_text
        FROM questions q
        JOIN categories c ON c.id = q.category_id
        WHERE q.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Question {id} not found")))?;

    let options = sqlx::query_as::<_, AnswerOption>(
        r#"
        SELECT id, question_id, text, is_correct, rationale, position
        FROM answer_options
        WHERE question_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(row.with_options(options))
}

/// The full catalog with options, as fed to the quiz composer.
pub async fn all_with_answers(pool: &SqlitePool) -> Result<Vec<QuestionWithAnswers>, AppError> {
    let rows = sqlx::query_as::<_, QuestionRow>(
        r#"
        SELECT q.id, q.category_id, c.name AS category_name, q.question_text
        FROM questions q
        JOIN categories c ON c.id = q.category_id
        ORDER BY q.id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let options = sqlx::query_as::<_, AnswerOption>(
        r#"
        SELECT id, question_id, text, is_correct, rationale, position
        FROM answer_options
        ORDER BY question_id, position, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut by_question: HashMap<i64, Vec<AnswerOption>> = HashMap::new();
    for option in options {
        by_question.entry(option.question_id).or_default().push(option);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let options = by_question.remove(&row.id).unwrap_or_default();
            row.with_options(options)
        })
        .collect())
}

/// Question headers for a submitted sequence, in the order the ids were
/// presented. An unknown id is a `ReferentialIntegrity` error.
pub async fn by_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<QuestionWithAnswers>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    // Dynamic IN clause
    let mut builder = QueryBuilder::<Sqlite>::new(
        r#"
        SELECT q.id, q.category_id, c.name AS category_name, q.question_text
        FROM questions q
        JOIN categories c ON c.id = q.category_id
        WHERE q.id IN ("#,
    );
    let mut separated = builder.separated(",");
    for id in ids {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    let rows: Vec<QuestionRow> = builder.build_query_as().fetch_all(pool).await?;
    let by_id: HashMap<i64, QuestionRow> = rows.into_iter().map(|r| (r.id, r)).collect();

    ids.iter()
        .map(|id| {
            by_id
                .get(id)
                .cloned()
                .map(|row| row.with_options(Vec::new()))
                .ok_or_else(|| AppError::ReferentialIntegrity(format!("Question {id} does not exist")))
        })
        .collect()
}

/// Creates a question and its options in one transaction.
pub async fn create(
    pool: &SqlitePool,
    category_id: i64,
    question_text: &str,
    answers: &[AnswerInput],
) -> Result<i64, AppError> {
    category::ensure_exists(pool, category_id).await?;

    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let question_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions (category_id, question_text, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(category_id)
    .bind(question_text)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    insert_options(&mut tx, question_id, answers).await?;

    tx.commit().await?;
    Ok(question_id)
}

/// Replace-all update: the question row and the complete option set are
/// rewritten together or not at all.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    category_id: i64,
    question_text: &str,
    answers: &[AnswerInput],
) -> Result<(), AppError> {
    category::ensure_exists(pool, category_id).await?;

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        "UPDATE questions SET category_id = ?, question_text = ?, updated_at = ? WHERE id = ?",
    )
    .bind(category_id)
    .bind(question_text)
    .bind(Utc::now())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Question {id} not found")));
    }

    sqlx::query("DELETE FROM answer_options WHERE question_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_options(&mut tx, id, answers).await?;

    tx.commit().await?;
    Ok(())
}

/// Deletes a question; its options go with it (cascade).
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Question {id} not found")));
    }
    Ok(())
}

/// Bulk import of a question-array document. The whole batch runs in one
/// transaction against partial writes; a malformed entry is skipped and
/// recorded under its input index without aborting the rest.
pub async fn bulk_import(
    pool: &SqlitePool,
    entries: &[ImportQuestion],
    category_id: i64,
) -> Result<ImportReport, AppError> {
    category::ensure_exists(pool, category_id).await?;

    let mut report = ImportReport::default();
    let mut tx = pool.begin().await?;
    let now = Utc::now();

    for (index, entry) in entries.iter().enumerate() {
        if entry.question.trim().is_empty() {
            report
                .errors
                .push(format!("Question at index {index} is missing its text"));
            continue;
        }
        if entry.answer_options.is_empty() {
            report
                .errors
                .push(format!("Question at index {index} has no answer options"));
            continue;
        }

        let question_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO questions (category_id, question_text, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(category_id)
        .bind(entry.question.trim())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        insert_options(&mut tx, question_id, &entry.answer_options).await?;
        report.added += 1;
    }

    tx.commit().await?;
    Ok(report)
}

/// Increments the question's lifetime success or failure counter by one.
/// Callers guarantee at-most-once per question per completed attempt.
pub async fn record_outcome(
    pool: &SqlitePool,
    question_id: i64,
    was_correct: bool,
) -> Result<(), AppError> {
    let sql = if was_correct {
        "UPDATE questions SET success_count = success_count + 1 WHERE id = ?"
    } else {
        "UPDATE questions SET failure_count = failure_count + 1 WHERE id = ?"
    };

    let result = sqlx::query(sql).bind(question_id).execute(pool).await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Question {question_id} not found")));
    }
    Ok(())
}

async fn insert_options(
    tx: &mut Transaction<'_, Sqlite>,
    question_id: i64,
    answers: &[AnswerInput],
) -> Result<(), AppError> {
    for (position, answer) in answers.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO answer_options (question_id, text, is_correct, rationale, position)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(question_id)
        .bind(answer.text.trim())
        .bind(answer.is_correct)
        .bind(&answer.rationale)
        .bind(position as i64)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
