// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'users' table in the database.
///
/// `email` is the durable identity key; `id` is supplied by the external
/// identity provider and can change across sign-ins for the same e-mail.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,

    /// 'user' or 'admin'. Allow-listed e-mails are admin regardless.
    pub role: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Profile asserted by the external identity provider on sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
}

/// DTO for changing a user's role.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}
