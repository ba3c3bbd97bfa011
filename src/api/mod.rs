//! HTTP API
//! Mission: Assemble public and bearer-protected routes into one router

pub mod auth;
pub mod notes;
pub mod students;
pub mod users;

use crate::auth::auth_middleware;
use crate::middleware::request_logging;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the class notes API" }))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build the full application router
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/auth/login", post(auth::login))
        .route("/auth/initialize", post(auth::initialize));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        // Content management
        .route("/notes", post(notes::create_note))
        .route("/notes/subjects", post(notes::create_subject))
        .route("/notes/topics", post(notes::create_topic))
        .route("/notes/subtopics", post(notes::create_subtopic))
        .route("/notes/illustrations", post(notes::create_illustration))
        .route("/notes/illustrations/:id", put(notes::update_illustration))
        .route("/notes/:id", delete(notes::delete_note))
        .route("/notes/:id/approve", patch(notes::approve_note))
        .route("/notes/:id/illustrations", get(notes::list_illustrations))
        .route(
            "/notes/:id/illustrations/:illustration_id",
            post(notes::attach_illustration),
        )
        // Read-only browsing
        .route("/students/subjects", get(students::subjects))
        .route("/students/subjects/:id/topics", get(students::topics))
        .route("/students/topics/:id/subtopics", get(students::subtopics))
        .route("/students/subtopics/:id/notes", get(students::notes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
