// src/models/category.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use std::sync::LazyLock;
use validator::Validate;

/// Represents the 'categories' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,

    /// URL-safe unique identifier (e.g., "tresorerie").
    pub slug: String,

    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// DTO for creating a new category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(custom(function = validate_slug))]
    pub slug: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    if slug.is_empty() || slug.len() > 100 || !SLUG_RE.is_match(slug) {
        return Err(validator::ValidationError::new("invalid_slug"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_validation() {
        assert!(validate_slug("tresorerie").is_ok());
        assert!(validate_slug("marches-financiers-2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Trésorerie").is_err());
        assert!(validate_slug("a b").is_err());
        assert!(validate_slug("-lead").is_err());
    }
}
