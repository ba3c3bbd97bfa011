//! Read-only browsing of published content, open to any signed-in user

use crate::content::{Note, SubTopic, Subject, Topic};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};

/// GET /students/subjects
pub async fn subjects(State(state): State<AppState>) -> AppResult<Json<Vec<Subject>>> {
    Ok(Json(state.content_store.list_subjects()?))
}

/// GET /students/subjects/:id/topics
pub async fn topics(
    State(state): State<AppState>,
    Path(subject_id): Path<i64>,
) -> AppResult<Json<Vec<Topic>>> {
    let topics = state.content_store.topics_for_subject(subject_id)?;
    non_empty(topics, "No topics found for this subject.")
}

/// GET /students/topics/:id/subtopics
pub async fn subtopics(
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
) -> AppResult<Json<Vec<SubTopic>>> {
    let subtopics = state.content_store.subtopics_for_topic(topic_id)?;
    non_empty(subtopics, "No subtopics found for this topic.")
}

/// GET /students/subtopics/:id/notes - approved notes only
pub async fn notes(
    State(state): State<AppState>,
    Path(subtopic_id): Path<i64>,
) -> AppResult<Json<Vec<Note>>> {
    let notes = state.content_store.approved_notes_for_subtopic(subtopic_id)?;
    non_empty(notes, "No approved notes found for this subtopic.")
}

fn non_empty<T>(items: Vec<T>, missing: &str) -> AppResult<Json<Vec<T>>> {
    if items.is_empty() {
        Err(AppError::not_found(missing))
    } else {
        Ok(Json(items))
    }
}
