// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'answer_options' table in the database.
/// Options are owned by their question and rewritten wholesale on edit.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub is_correct: bool,
    pub rationale: Option<String>,

    /// Explicit presentation order, preserved across edits.
    pub position: i64,
}

/// A question joined with its category name and ordered answer options,
/// as consumed by the quiz composer and the admin edit form.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithAnswers {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub question_text: String,
    pub answer_options: Vec<AnswerOption>,
}

/// Listing row for the admin question table: no options, but the category
/// name, the option count and the lifetime outcome counters.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionSummary {
    pub id: i64,
    pub category_id: i64,
    pub category_name: String,
    pub question_text: String,
    pub success_count: i64,
    pub failure_count: i64,
    pub answer_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A page of the question listing.
#[derive(Debug, Serialize)]
pub struct QuestionPage {
    pub questions: Vec<QuestionSummary>,
    pub total: i64,
}

/// Filters for the question listing. Newest questions come first.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionFilter {
    pub category_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// One answer option as submitted by the admin forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// DTO for creating or replacing a question. The interactive admin path
/// requires at least 2 options and at least one marked correct.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub category_id: i64,
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[validate(custom(function = validate_answers))]
    pub answers: Vec<AnswerInput>,
}

fn validate_answers(answers: &[AnswerInput]) -> Result<(), validator::ValidationError> {
    if answers.len() < 2 {
        return Err(validator::ValidationError::new("at_least_two_answers"));
    }
    if answers.iter().any(|a| a.text.trim().is_empty()) {
        return Err(validator::ValidationError::new("answer_text_required"));
    }
    if !answers.iter().any(|a| a.is_correct) {
        return Err(validator::ValidationError::new("no_correct_answer"));
    }
    Ok(())
}

/// One entry of a bulk-import document:
/// `[{question, answerOptions: [{text, isCorrect, rationale?}]}]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer_options: Vec<AnswerInput>,
}

/// Outcome of a bulk import: how many questions were inserted, and one error
/// string per skipped entry, keyed by its index in the input document.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub added: usize,
    pub errors: Vec<String>,
}
