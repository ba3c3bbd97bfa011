//! Content Management Endpoints
//! Mission: Teachers author the hierarchy and notes, admins moderate them

use crate::auth::{authorize, require_admin, require_role, Principal, UserRole};
use crate::content::models::{
    CreateIllustration, CreateNote, CreateSubTopic, CreateSubject, CreateTopic,
    UpdateIllustration,
};
use crate::content::{Illustration, Note, SubTopic, Subject, Topic};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

const AUTHORS: &[UserRole] = &[UserRole::Admin, UserRole::Teacher];

/// POST /notes/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateSubject>,
) -> AppResult<(StatusCode, Json<Subject>)> {
    require_role(&principal, AUTHORS, "create subjects")?;
    let subject = state.content_store.create_subject(&payload)?;
    Ok((StatusCode::CREATED, Json(subject)))
}

/// POST /notes/topics
pub async fn create_topic(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateTopic>,
) -> AppResult<(StatusCode, Json<Topic>)> {
    require_role(&principal, AUTHORS, "create topics")?;
    let topic = state.content_store.create_topic(&payload)?;
    Ok((StatusCode::CREATED, Json(topic)))
}

/// POST /notes/subtopics
pub async fn create_subtopic(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateSubTopic>,
) -> AppResult<(StatusCode, Json<SubTopic>)> {
    require_role(&principal, AUTHORS, "create subtopics")?;
    let subtopic = state.content_store.create_subtopic(&payload)?;
    Ok((StatusCode::CREATED, Json(subtopic)))
}

/// POST /notes - the caller becomes the note's creator
pub async fn create_note(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateNote>,
) -> AppResult<(StatusCode, Json<Note>)> {
    require_role(&principal, &[UserRole::Teacher], "create notes")?;
    let note = state.content_store.create_note(&payload, principal.id)?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// PATCH /notes/:id/approve
pub async fn approve_note(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(note_id): Path<i64>,
) -> AppResult<Json<Note>> {
    require_admin(&principal, "approve notes")?;
    let note = state.content_store.approve_note(note_id)?;
    info!("{} approved note {}", principal.username, note_id);
    Ok(Json(note))
}

/// DELETE /notes/:id
pub async fn delete_note(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(note_id): Path<i64>,
) -> AppResult<StatusCode> {
    require_admin(&principal, "delete notes")?;
    state.content_store.delete_note(note_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /notes/illustrations
pub async fn create_illustration(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateIllustration>,
) -> AppResult<(StatusCode, Json<Illustration>)> {
    require_role(&principal, AUTHORS, "create illustrations")?;
    if let Some(note_id) = payload.note_id {
        ensure_note_editor(&state, &principal, note_id)?;
    }
    let illustration = state.content_store.create_illustration(&payload)?;
    Ok((StatusCode::CREATED, Json(illustration)))
}

/// PUT /notes/illustrations/:id
pub async fn update_illustration(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(illustration_id): Path<i64>,
    Json(payload): Json<UpdateIllustration>,
) -> AppResult<Json<Illustration>> {
    require_role(&principal, AUTHORS, "update illustrations")?;
    let illustration = state
        .content_store
        .update_illustration(illustration_id, &payload)?;
    Ok(Json(illustration))
}

/// POST /notes/:id/illustrations/:illustration_id (admin or the note's creator)
pub async fn attach_illustration(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((note_id, illustration_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    ensure_note_editor(&state, &principal, note_id)?;

    state
        .content_store
        .attach_illustration(note_id, illustration_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /notes/:id/illustrations - any signed-in user may read these
pub async fn list_illustrations(
    State(state): State<AppState>,
    Path(note_id): Path<i64>,
) -> AppResult<Json<Vec<Illustration>>> {
    let illustrations = state.content_store.illustrations_for_note(note_id)?;
    Ok(Json(illustrations))
}

/// Admin, or the note's author; notes whose author is gone need an admin
fn ensure_note_editor(state: &AppState, principal: &Principal, note_id: i64) -> AppResult<()> {
    let note = state
        .content_store
        .get_note(note_id)?
        .ok_or_else(|| AppError::not_found("Note not found."))?;

    match note.created_by_id {
        Some(creator_id) => authorize(principal, creator_id)
            .map(|_| ())
            .map_err(|_| AppError::forbidden("Only admins or the note's author can do that.")),
        None => require_admin(principal, "edit notes without an author").map(|_| ()),
    }
}
