// src/handlers/admin.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    db,
    error::AppError,
    models::{
        category::CreateCategoryRequest,
        question::{CreateQuestionRequest, ImportQuestion, QuestionFilter},
        user::{ROLE_ADMIN, ROLE_USER, UpdateRoleRequest},
    },
    utils::jwt::Claims,
};

/// Lists all categories.
/// Admin only.
pub async fn list_categories(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let categories = db::category::list(&pool).await?;
    Ok(Json(categories))
}

/// Creates a new category.
/// Admin only.
pub async fn create_category(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let category = db::category::create(
        &pool,
        &payload.name,
        &payload.slug,
        payload.description.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Paginated question listing with optional category and text filters.
/// Admin only.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    Query(filter): Query<QuestionFilter>,
) -> Result<impl IntoResponse, AppError> {
    let page = db::question::list(&pool, &filter).await?;
    Ok(Json(page))
}

/// One question with its ordered answer options.
/// Admin only.
pub async fn get_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = db::question::get(&pool, id).await?;
    Ok(Json(question))
}

/// Creates a new quiz question with its answer set.
/// Admin only.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    let id = db::question::create(
        &pool,
        payload.category_id,
        payload.question_text.trim(),
        &payload.answers,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Updates a question, replacing its whole answer set.
/// Admin only.
pub async fn update_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::Validation(validation_errors.to_string()));
    }

    db::question::update(
        &pool,
        id,
        payload.category_id,
        payload.question_text.trim(),
        &payload.answers,
    )
    .await?;

    Ok(StatusCode::OK)
}

/// Deletes a question and its answer options.
/// Admin only.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    db::question::delete(&pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ImportParams {
    pub category: i64,
}

/// Bulk import of a question-array JSON document into one category.
/// Malformed entries are skipped and reported by index.
/// Admin only.
pub async fn import_questions(
    State(pool): State<SqlitePool>,
    Query(params): Query<ImportParams>,
    Json(entries): Json<Vec<ImportQuestion>>,
) -> Result<impl IntoResponse, AppError> {
    let report = db::question::bulk_import(&pool, &entries, params.category).await?;
    Ok(Json(report))
}

/// Lists all users.
/// Admin only.
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = db::user::list(&pool).await?;
    Ok(Json(users))
}

/// Deletes a user; their attempts cascade away. Self-deletion is rejected.
/// Admin only.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.sub {
        return Err(AppError::Permission(
            "Cannot delete your own account".to_string(),
        ));
    }

    db::user::delete(&pool, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Changes a user's role. Self-demotion is rejected.
/// Admin only.
pub async fn update_user_role(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.role != ROLE_ADMIN && payload.role != ROLE_USER {
        return Err(AppError::Validation(format!(
            "Invalid role '{}'",
            payload.role
        )));
    }
    if id == claims.sub && payload.role != ROLE_ADMIN {
        return Err(AppError::Permission("Cannot demote yourself".to_string()));
    }

    db::user::update_role(&pool, &id, &payload.role).await?;
    Ok(StatusCode::OK)
}

/// A user's profile and aggregate statistics, viewed by an admin.
pub async fn user_stats(
    State(pool): State<SqlitePool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = db::user::get(&pool, &id).await?;
    let stats = db::score::user_stats(&pool, &id).await?;

    Ok(Json(serde_json::json!({ "user": user, "stats": stats })))
}

/// Fleet-wide dashboard aggregates.
/// Admin only.
pub async fn dashboard(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let dashboard = db::dashboard::collect(&pool).await?;
    Ok(Json(dashboard))
}
