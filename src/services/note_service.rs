use std::time::SystemTime;

use tracing::info;

use crate::{
    dao::models::{MedicalNoteEntity, RecordKind, UserEntity},
    dto::{
        common::OkResponse,
        note::{NoteInput, NoteSummary},
    },
    error::ServiceError,
    services::patient_service::{ensure_record_owner, owned_patient},
    state::SharedState,
};

async fn owned_note(
    state: &SharedState,
    user: &UserEntity,
    note_id: i64,
) -> Result<MedicalNoteEntity, ServiceError> {
    let store = state.require_med_store().await?;
    let note = store
        .find_note(note_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("note not found".into()))?;
    ensure_record_owner(&store, user.id, note.patient_id).await?;
    Ok(note)
}

/// Notes of an owned patient.
pub async fn list_notes(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
) -> Result<Vec<NoteSummary>, ServiceError> {
    let store = state.require_med_store().await?;
    owned_patient(&store, user.id, patient_id).await?;
    let notes = store.list_notes(patient_id).await?;
    Ok(notes.into_iter().map(NoteSummary::from).collect())
}

/// Attach a note to an owned patient.
pub async fn create_note(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
    input: NoteInput,
) -> Result<NoteSummary, ServiceError> {
    let store = state.require_med_store().await?;
    owned_patient(&store, user.id, patient_id).await?;

    let note = MedicalNoteEntity {
        id: store.next_id(RecordKind::Notes).await?,
        patient_id,
        text: input.text.trim().to_owned(),
        created_at: SystemTime::now(),
    };
    store.save_note(note.clone()).await?;

    info!(patient_id, note_id = note.id, "created note");
    Ok(note.into())
}

/// Replace the text of a note; the creation time is kept.
pub async fn update_note(
    state: &SharedState,
    user: &UserEntity,
    note_id: i64,
    input: NoteInput,
) -> Result<NoteSummary, ServiceError> {
    let mut note = owned_note(state, user, note_id).await?;
    note.text = input.text.trim().to_owned();

    let store = state.require_med_store().await?;
    store.save_note(note.clone()).await?;
    info!(note_id, "updated note");
    Ok(note.into())
}

/// Remove a note. Notes of other users yield 403.
pub async fn delete_note(
    state: &SharedState,
    user: &UserEntity,
    note_id: i64,
) -> Result<OkResponse, ServiceError> {
    owned_note(state, user, note_id).await?;
    let store = state.require_med_store().await?;
    if !store.delete_note(note_id).await? {
        return Err(ServiceError::NotFound("note not found".into()));
    }
    info!(note_id, "deleted note");
    Ok(OkResponse::ok())
}
