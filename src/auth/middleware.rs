//! Authentication Middleware
//! Mission: Protect API endpoints with bearer-token validation
//!
//! The token's signature and expiry are checked first, then the subject is
//! looked up again so deleted accounts lose access immediately and the stored
//! role (not the one frozen into the token) drives authorization.

use crate::auth::{guard::Principal, jwt::TokenError};
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

/// Auth middleware that validates bearer tokens and attaches the [`Principal`]
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let TypedHeader(Authorization(bearer)) = parts
        .extract::<TypedHeader<Authorization<Bearer>>>()
        .await
        .map_err(|rejection| {
            if rejection.is_missing() {
                AppError::unauthorized("Missing authorization token")
            } else {
                AppError::unauthorized("Invalid authorization format. Use: Bearer {token}")
            }
        })?;

    let claims = state
        .jwt_handler
        .verify(bearer.token())
        .map_err(token_error)?;

    let user = state
        .user_store
        .get_user_by_username(&claims.sub)?
        .ok_or_else(|| {
            debug!("Token subject {} no longer exists", claims.sub);
            AppError::unauthorized("Could not validate credentials")
        })?;

    parts.extensions.insert(Principal::from_user(&user));

    Ok(next.run(Request::from_parts(parts, body)).await)
}

fn token_error(err: TokenError) -> AppError {
    match err {
        TokenError::Expired => AppError::unauthorized("Token has expired"),
        TokenError::Invalid => AppError::unauthorized("Could not validate credentials"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{CreateUserRequest, UserRole};
    use crate::config::Config;
    use crate::db::Database;
    use axum::{
        body::Body,
        http::{header, Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Extension, Router,
    };
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let mut config = Config::new("middleware-test-secret", "bootstrap");
        config.bcrypt_cost = 4;
        AppState::new(config, Database::in_memory().unwrap())
    }

    fn protected(state: AppState) -> Router {
        Router::new()
            .route(
                "/whoami",
                get(|Extension(p): Extension<Principal>| async move { p.username }),
            )
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
            .with_state(state)
    }

    async fn call(app: Router, auth: Option<&str>) -> StatusCode {
        let mut builder = HttpRequest::builder().uri("/whoami");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    fn create_student(state: &AppState) -> crate::auth::models::User {
        state
            .user_store
            .create_user(&CreateUserRequest {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                first_name: None,
                last_name: None,
                role: UserRole::Student,
                password: "password123".to_string(),
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_and_malformed_headers() {
        let state = test_state();
        assert_eq!(call(protected(state.clone()), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(
            call(protected(state.clone()), Some("Basic dXNlcjpwYXNz")).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            call(protected(state), Some("Bearer not-a-jwt")).await,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        let state = test_state();
        let user = create_student(&state);
        let issued = state.jwt_handler.issue_for(&user).unwrap();

        let status = call(
            protected(state),
            Some(&format!("Bearer {}", issued.token)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_deleted_user_token_rejected() {
        let state = test_state();
        let user = create_student(&state);
        let issued = state.jwt_handler.issue_for(&user).unwrap();

        state.user_store.delete_user(user.id).unwrap();

        let status = call(
            protected(state),
            Some(&format!("Bearer {}", issued.token)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_token_error_mapping() {
        assert!(matches!(token_error(TokenError::Expired), AppError::Unauthorized(_)));
        assert!(matches!(token_error(TokenError::Invalid), AppError::Unauthorized(_)));
    }
}
