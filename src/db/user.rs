// src/db/user.rs

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::user::{Identity, User};

const USER_COLUMNS: &str = "id, email, name, image, role, created_at";

/// Sign-in reconciliation. The e-mail is the durable identity key: when the
/// provider re-issues an id for a known e-mail, the parent-row update
/// cascades to the user's score rows (ON UPDATE CASCADE), so referential
/// integrity holds throughout. New users get `initial_role`.
pub async fn get_or_create(
    pool: &SqlitePool,
    identity: &Identity,
    initial_role: &str,
) -> Result<User, AppError> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(&identity.email)
    .fetch_optional(&mut *tx)
    .await?;

    let user = match existing {
        Some(mut user) => {
            sqlx::query("UPDATE users SET id = ?, name = ?, image = ? WHERE email = ?")
                .bind(&identity.id)
                .bind(&identity.name)
                .bind(&identity.image)
                .bind(&identity.email)
                .execute(&mut *tx)
                .await?;

            user.id = identity.id.clone();
            user.name = identity.name.clone();
            user.image = identity.image.clone();
            user
        }
        None => {
            let created_at = Utc::now();
            sqlx::query(
                "INSERT INTO users (id, email, name, image, role, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&identity.id)
            .bind(&identity.email)
            .bind(&identity.name)
            .bind(&identity.image)
            .bind(initial_role)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;

            User {
                id: identity.id.clone(),
                email: identity.email.clone(),
                name: identity.name.clone(),
                image: identity.image.clone(),
                role: initial_role.to_string(),
                created_at,
            }
        }
    };

    tx.commit().await?;
    Ok(user)
}

pub async fn get(pool: &SqlitePool, id: &str) -> Result<User, AppError> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(users)
}

/// Deletes a user; their score rows cascade away with them.
pub async fn delete(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {id} not found")));
    }
    Ok(())
}

pub async fn update_role(pool: &SqlitePool, id: &str, role: &str) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {id} not found")));
    }
    Ok(())
}
