//! Authentication API Endpoints
//! Mission: Provide login, current-user and first-admin bootstrap endpoints

use crate::auth::{
    models::{CreateUserRequest, LoginRequest, TokenResponse, UserResponse},
    Principal,
};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct InitializeQuery {
    pub secret_key: Option<String>,
}

/// Login endpoint - POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    info!("Login attempt: {}", payload.username);

    let user = state
        .user_store
        .authenticate(&payload.username, &payload.password)?
        .ok_or_else(|| {
            warn!("Failed login attempt: {}", payload.username);
            AppError::unauthorized("Invalid username or password")
        })?;

    let issued = state.jwt_handler.issue_for(&user)?;

    info!("Login successful: {} ({})", user.username, user.role);

    Ok(Json(TokenResponse::bearer(issued.token, issued.expires_in)))
}

/// Current user - GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_store
        .get_user_by_id(principal.id)?
        .ok_or_else(|| AppError::not_found("User not found."))?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// First admin bootstrap - POST /auth/initialize?secret_key=...
///
/// Refused with 400 once any admin exists, whatever the secret.
pub async fn initialize(
    State(state): State<AppState>,
    Query(query): Query<InitializeQuery>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    if state.user_store.admin_exists()? {
        warn!("Bootstrap refused: an admin already exists");
        return Err(AppError::bad_request("System already initialized."));
    }

    if query.secret_key.as_deref() != Some(state.config.initialize_secret_key.as_str()) {
        warn!("Bootstrap refused: invalid secret key");
        return Err(AppError::forbidden("Invalid secret key."));
    }

    // Re-checks "no admin yet" under the same lock as the insert.
    let user = state.user_store.create_initial_admin(&payload)?;

    info!("Initial admin created: {}", user.username);

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}
