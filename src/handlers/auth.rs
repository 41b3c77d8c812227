use axum::{extract::State, http::StatusCode, response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, Claims};
use crate::config;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

/// POST /auth/register - create a user account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = payload.email.unwrap_or_default();
    if email.trim().is_empty() {
        return Err(ApiError::missing_field("email"));
    }
    let password = payload.password.unwrap_or_default();
    if password.is_empty() {
        return Err(ApiError::missing_field("password"));
    }
    let name = payload.name.unwrap_or_default();

    let email = auth::normalize_email(email.trim());
    let password_hash = auth::hash_password(&email, &password);
    let user = state.store.create_user(&email, &name, &password_hash).await?;

    tracing::info!("registered user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": user })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /auth/login - authenticate and receive a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let email = auth::normalize_email(payload.email.unwrap_or_default().trim());
    let password = payload.password.unwrap_or_default();

    let user = state
        .store
        .user_by_email(&email)
        .await?
        .filter(|u| auth::verify_password(&u.email, &password, &u.password_hash))
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let token = auth::generate_jwt(Claims::new(user.id, user.email.clone()))?;
    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "user": user,
            "expires_in": expires_in
        }
    })))
}

/// GET /api/auth/whoami - current authenticated user
pub async fn whoami(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .store
        .user_by_id(auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Unknown user"))?;
    Ok(Json(json!({ "success": true, "data": user })))
}
