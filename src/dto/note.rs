use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::MedicalNoteEntity,
    dto::{format_system_time, validation::validate_not_blank},
};

/// Body of a medical note.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct NoteInput {
    /// Note body, at most 20000 characters and not blank.
    #[validate(length(max = 20000), custom(function = "validate_not_blank"))]
    pub text: String,
}

/// Note as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteSummary {
    /// Note identifier.
    pub id: i64,
    /// Patient the note belongs to.
    pub patient_id: i64,
    /// Note body.
    pub text: String,
    /// RFC 3339 creation time. Unchanged by edits.
    pub created_at: String,
}

impl From<MedicalNoteEntity> for NoteSummary {
    fn from(note: MedicalNoteEntity) -> Self {
        Self {
            id: note.id,
            patient_id: note.patient_id,
            text: note.text,
            created_at: format_system_time(note.created_at),
        }
    }
}
