//! User Management Endpoints
//! Mission: Admin-managed accounts, with self-service reads and profile updates

use crate::auth::{
    authorize,
    models::{CreateUserRequest, UpdateUserRequest, UserResponse},
    require_admin, Principal,
};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Resolve defaults and check bounds, yielding `(skip, limit)`
    pub fn resolve(&self) -> AppResult<(u32, u32)> {
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);

        let skip = u32::try_from(skip)
            .map_err(|_| AppError::bad_request("skip must be a non-negative integer"))?;
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(AppError::bad_request(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok((skip, limit as u32))
    }
}

/// List users - GET /users (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(page): Query<Pagination>,
) -> AppResult<Json<Vec<UserResponse>>> {
    require_admin(&principal, "list users")?;
    let (skip, limit) = page.resolve()?;

    let users = state.user_store.list_users(skip, limit)?;
    Ok(Json(users.iter().map(UserResponse::from_user).collect()))
}

/// Get user - GET /users/:id (admin or self)
pub async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_store
        .get_user_by_id(user_id)?
        .ok_or_else(|| AppError::not_found("User not found."))?;
    authorize(&principal, user.id)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Create user - POST /users (admin only)
pub async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    require_admin(&principal, "create users")?;

    let user = state.user_store.create_user(&payload)?;
    info!("{} created user {} ({})", principal.username, user.username, user.role);

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Update user - PUT /users/:id (admin or self; role changes admin only)
pub async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    if state.user_store.get_user_by_id(user_id)?.is_none() {
        return Err(AppError::not_found("User not found."));
    }
    authorize(&principal, user_id)?;

    if payload.role.is_some() && !principal.is_admin() {
        warn!("{} attempted to change a role", principal.username);
        return Err(AppError::forbidden("Only admins can change user roles."));
    }

    let user = state
        .user_store
        .update_user(user_id, &payload)?
        .ok_or_else(|| AppError::not_found("User not found."))?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Delete user - DELETE /users/:id (admin only)
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<i64>,
) -> AppResult<StatusCode> {
    require_admin(&principal, "delete users")?;

    if principal.id == user_id {
        return Err(AppError::bad_request("Cannot delete your own account."));
    }

    state.user_store.delete_user(user_id)?;
    info!("{} deleted user {}", principal.username, user_id);

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::api::test_support::*;
    use crate::auth::UserRole;
    use axum::http::Method;
    use serde_json::json;

    #[test]
    fn test_pagination_bounds() {
        assert_eq!(Pagination::default().resolve().unwrap(), (0, 10));

        let page = Pagination {
            skip: Some(5),
            limit: Some(100),
        };
        assert_eq!(page.resolve().unwrap(), (5, 100));

        for (skip, limit) in [(Some(-1), None), (None, Some(0)), (None, Some(101))] {
            let page = Pagination { skip, limit };
            assert!(matches!(page.resolve(), Err(AppError::BadRequest(_))));
        }
    }

    #[tokio::test]
    async fn test_list_users_admin_only() {
        let state = test_state();
        let admin = seed_user(&state, "admin", UserRole::Admin);
        let student = seed_user(&state, "alice", UserRole::Student);
        let admin_token = token_for(&state, &admin);
        let student_token = token_for(&state, &student);
        let app = build_router(state);

        let (status, body) = send(&app, Method::GET, "/users", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) =
            send(&app, Method::GET, "/users?skip=1&limit=1", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["username"], "alice");

        let (status, _) =
            send(&app, Method::GET, "/users?limit=500", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::GET, "/users", Some(&student_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_get_user_admin_or_self() {
        let state = test_state();
        let alice = seed_user(&state, "alice", UserRole::Student);
        let bob = seed_user(&state, "bob", UserRole::Student);
        let token = token_for(&state, &alice);
        let app = build_router(state);

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/users/{}", alice.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alice");

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/users/{}", bob.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = send(&app, Method::GET, "/users/9999", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_user_conflict() {
        let state = test_state();
        let admin = seed_user(&state, "admin", UserRole::Admin);
        let token = token_for(&state, &admin);
        let app = build_router(state);

        let body = json!({
            "username": "carol",
            "email": "carol@example.com",
            "role": "teacher",
            "password": "password123"
        });
        let (status, created) =
            send(&app, Method::POST, "/users", Some(&token), Some(body.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["role"], "teacher");

        let (status, _) = send(&app, Method::POST, "/users", Some(&token), Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_self_update_cannot_change_role() {
        let state = test_state();
        let alice = seed_user(&state, "alice", UserRole::Student);
        let token = token_for(&state, &alice);
        let app = build_router(state.clone());
        let uri = format!("/users/{}", alice.id);

        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"first_name": "Alice"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["first_name"], "Alice");

        let (status, _) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"role": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let stored = state.user_store.get_user_by_id(alice.id).unwrap().unwrap();
        assert_eq!(stored.role, UserRole::Student);
    }

    #[tokio::test]
    async fn test_demotion_applies_to_existing_token() {
        let state = test_state();
        let admin = seed_user(&state, "admin", UserRole::Admin);
        let other = seed_user(&state, "boss", UserRole::Admin);
        let boss_token = token_for(&state, &other);
        let admin_token = token_for(&state, &admin);
        let app = build_router(state);

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/users/{}", other.id),
            Some(&admin_token),
            Some(json!({"role": "student"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::GET, "/users", Some(&boss_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let state = test_state();
        let admin = seed_user(&state, "admin", UserRole::Admin);
        let alice = seed_user(&state, "alice", UserRole::Student);
        let token = token_for(&state, &admin);
        let app = build_router(state);

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/users/{}", admin.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/users/{}", alice.id);
        let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_null());

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
