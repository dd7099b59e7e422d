// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde::Deserialize;

use crate::{
    db,
    error::AppError,
    models::user::{Identity, ROLE_ADMIN, ROLE_USER},
    state::AppState,
    utils::jwt::{sign_jwt, verify_identity_token},
};

/// DTO for exchanging a provider identity token for an API session.
#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub token: String,
}

/// Sign-in: verifies the provider's identity assertion, reconciles the user
/// row by e-mail (migrating score rows if the provider re-issued the id),
/// and returns an API token carrying the effective role.
pub async fn create_session(
    State(state): State<AppState>,
    Json(payload): Json<SessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let claims = verify_identity_token(&payload.token, &state.config.jwt_secret)?;

    let identity = Identity {
        id: claims.sub,
        email: claims.email,
        name: claims.name,
        image: claims.picture,
    };

    // Allow-listed e-mails are admin from their very first sign-in.
    let initial_role = if state.config.is_allowlisted_admin(&identity.email) {
        ROLE_ADMIN
    } else {
        ROLE_USER
    };

    let user = db::user::get_or_create(&state.pool, &identity, initial_role).await?;

    let role = if state.config.is_allowlisted_admin(&user.email) {
        ROLE_ADMIN
    } else {
        user.role.as_str()
    };
    let token = sign_jwt(&user, role, &state.config.jwt_secret, state.config.jwt_expiration)?;

    Ok(Json(serde_json::json!({
        "token": token,
        "role": role,
        "user": user,
    })))
}
