use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use validator::Validate;

use crate::{
    dto::{
        common::OkResponse,
        note::{NoteInput, NoteSummary},
    },
    error::AppError,
    routes::{auth::CurrentUser, extract::{AppJson, AppPath}},
    services::note_service,
    state::SharedState,
};

/// Clinical note routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/patients/{pid}/notes", get(list_notes).post(create_note))
        .route("/notes/{note_id}", put(update_note).delete(delete_note))
}

/// List the notes of a patient.
#[utoipa::path(
    get,
    path = "/patients/{pid}/notes",
    tag = "notes",
    params(("pid" = i64, Path, description = "Patient identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Notes of the patient", body = [NoteSummary]),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn list_notes(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
) -> Result<Json<Vec<NoteSummary>>, AppError> {
    Ok(Json(note_service::list_notes(&state, &user, pid).await?))
}

/// Attach a note to a patient.
#[utoipa::path(
    post,
    path = "/patients/{pid}/notes",
    tag = "notes",
    params(("pid" = i64, Path, description = "Patient identifier")),
    request_body = NoteInput,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Note created", body = NoteSummary),
        (status = 400, description = "Empty note"),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn create_note(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
    AppJson(payload): AppJson<NoteInput>,
) -> Result<(StatusCode, Json<NoteSummary>), AppError> {
    payload.validate()?;
    let note = note_service::create_note(&state, &user, pid, payload).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Replace the text of a note.
#[utoipa::path(
    put,
    path = "/notes/{note_id}",
    tag = "notes",
    params(("note_id" = i64, Path, description = "Note identifier")),
    request_body = NoteInput,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated note", body = NoteSummary),
        (status = 403, description = "Note belongs to another user"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn update_note(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(note_id): AppPath<i64>,
    AppJson(payload): AppJson<NoteInput>,
) -> Result<Json<NoteSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        note_service::update_note(&state, &user, note_id, payload).await?,
    ))
}

/// Delete a note.
#[utoipa::path(
    delete,
    path = "/notes/{note_id}",
    tag = "notes",
    params(("note_id" = i64, Path, description = "Note identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Note deleted", body = OkResponse),
        (status = 403, description = "Note belongs to another user"),
        (status = 404, description = "Note not found")
    )
)]
pub async fn delete_note(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(note_id): AppPath<i64>,
) -> Result<Json<OkResponse>, AppError> {
    Ok(Json(note_service::delete_note(&state, &user, note_id).await?))
}
