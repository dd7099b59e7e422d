// src/db/category.rs

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::category::Category;

/// The reference categories the question bank ships with. Seeding is
/// idempotent: slugs are unique and re-runs are ignored.
const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Mouvement", "mouvement"),
    ("CLR", "clr"),
    ("Organisationnel", "organisationnel"),
    ("Trésorerie", "tresorerie"),
];

pub async fn list(pool: &SqlitePool) -> Result<Vec<Category>, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, description, created_at FROM categories ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

pub async fn create(
    pool: &SqlitePool,
    name: &str,
    slug: &str,
    description: Option<&str>,
) -> Result<Category, AppError> {
    let created_at = Utc::now();

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO categories (name, slug, description, created_at) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(slug)
    .bind(description)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => AppError::Conflict(format!("Category slug '{slug}' already exists")),
        other => other,
    })?;

    Ok(Category {
        id,
        name: name.to_string(),
        slug: slug.to_string(),
        description: description.map(str::to_string),
        created_at,
    })
}

/// Looks up a category id, returning `ReferentialIntegrity` when absent.
/// Called before transactions that reference a category.
pub async fn ensure_exists(pool: &SqlitePool, category_id: i64) -> Result<(), AppError> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM categories WHERE id = ?")
        .bind(category_id)
        .fetch_optional(pool)
        .await?;

    found
        .map(|_| ())
        .ok_or_else(|| AppError::ReferentialIntegrity(format!("Category {category_id} does not exist")))
}

/// Startup seeding of the fixed category set.
pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), AppError> {
    for (name, slug) in DEFAULT_CATEGORIES {
        sqlx::query("INSERT OR IGNORE INTO categories (name, slug, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(slug)
            .bind(Utc::now())
            .execute(pool)
            .await?;
    }
    Ok(())
}
