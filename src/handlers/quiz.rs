// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    db,
    error::AppError,
    models::{
        exam_mode::ExamMode,
        score::{NewScore, SubmitScoreRequest},
    },
    quiz,
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub mode: Option<ExamMode>,
    pub count: Option<usize>,
    /// Comma-separated category names, e.g. "CLR,Mouvement".
    pub categories: Option<String>,
}

/// Composes a randomized quiz. An official mode fixes the question count and
/// category set; otherwise `count` and `categories` drive an ad-hoc quiz.
pub async fn generate_quiz(
    State(pool): State<SqlitePool>,
    Query(params): Query<GenerateParams>,
) -> Result<impl IntoResponse, AppError> {
    let (count, categories) = match params.mode.and_then(ExamMode::config) {
        Some(config) => (
            config.question_count,
            config.categories.iter().map(|c| c.to_string()).collect(),
        ),
        None => {
            let categories: Vec<String> = params
                .categories
                .as_deref()
                .unwrap_or("")
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from)
                .collect();
            (params.count.unwrap_or(100), categories)
        }
    };

    let catalog = db::question::all_with_answers(&pool).await?;
    let questions = quiz::compose(catalog, count, &categories, &mut rand::thread_rng());

    Ok(Json(serde_json::json!({ "questions": questions })))
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub mode: ExamMode,
    pub limit: Option<i64>,
}

/// Best attempt per user for an official mode.
pub async fn get_leaderboard(
    State(pool): State<SqlitePool>,
    Query(params): Query<LeaderboardParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let leaderboard = db::score::leaderboard(&pool, params.mode, limit).await?;

    Ok(Json(serde_json::json!({ "leaderboard": leaderboard })))
}

/// Submits a completed attempt.
///
/// * Validates the mode before touching storage.
/// * Rescores the attempt server-side from the presented question sequence.
/// * Persists the score row, then best-effort updates the per-question
///   outcome counters - a counter failure never fails the submission.
pub async fn submit_score(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !payload.exam_mode.is_official() {
        return Err(AppError::Validation(format!(
            "Exam mode '{}' is not eligible for the scoreboard",
            payload.exam_mode
        )));
    }
    if payload.question_ids.is_empty() {
        return Err(AppError::Validation("No questions submitted".to_string()));
    }
    if payload.answers.len() > payload.question_ids.len() {
        return Err(AppError::Validation(
            "More answers than presented questions".to_string(),
        ));
    }

    let questions = db::question::by_ids(&pool, &payload.question_ids).await?;
    let result = quiz::calculate_result(&questions, &payload.answers, payload.time_spent);

    let saved = db::score::save(
        &pool,
        &NewScore {
            user_id: claims.sub.clone(),
            exam_mode: payload.exam_mode,
            score: result.score,
            total_questions: result.total_questions,
            correct_answers: result.correct_answers,
            time_spent: result.time_spent,
            category_scores: result.category_scores,
        },
    )
    .await?;

    for (index, question) in questions.iter().enumerate() {
        let Some(answer) = payload.answers.get(index) else {
            continue;
        };
        if let Err(err) = db::question::record_outcome(&pool, question.id, answer.is_correct).await
        {
            tracing::warn!(question_id = question.id, "statistics update failed: {err}");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "score": saved })),
    ))
}

/// The signed-in user's profile and aggregate statistics.
pub async fn get_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = db::user::get(&pool, &claims.sub).await?;
    let stats = db::score::user_stats(&pool, &claims.sub).await?;

    Ok(Json(serde_json::json!({ "user": user, "stats": stats })))
}
