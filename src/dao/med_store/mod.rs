/// In-memory store used by tests and as the fallback backend.
pub mod memory;
/// MongoDB-backed store.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    AppointmentEntity, MedicalNoteEntity, PatientEntity, PhotoEntity, RecordKind, UserEntity,
    VitalSignEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

pub use memory::MemoryMedStore;

/// Abstraction over the persistence layer for users, patients and their records.
///
/// Identifiers are allocated by the store through [`MedStore::next_id`] before a
/// record is saved, so `save_*` methods behave as upserts keyed on `id`.
pub trait MedStore: Send + Sync {
    /// Allocate the next identifier of the given record kind (starting at 1).
    fn next_id(&self, kind: RecordKind) -> BoxFuture<'static, StorageResult<i64>>;

    /// Insert a new user, failing with [`StorageError::Duplicate`] when the e-mail is taken.
    ///
    /// [`StorageError::Duplicate`]: crate::dao::storage::StorageError::Duplicate
    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a user by id.
    fn find_user(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Look up a user by its normalised e-mail.
    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Every user, ordered by id.
    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>>;

    /// Insert or replace a patient.
    fn save_patient(&self, patient: PatientEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a patient by id, regardless of owner.
    fn find_patient(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PatientEntity>>>;
    /// List the patients of `user_id`, ordered by id. `search` is a
    /// case-insensitive substring matched against the patient name.
    fn list_patients(
        &self,
        user_id: i64,
        search: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<PatientEntity>>>;
    /// Delete a patient together with every record attached to it.
    fn delete_patient(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert or replace an appointment.
    fn save_appointment(
        &self,
        appointment: AppointmentEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up an appointment by id.
    fn find_appointment(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<AppointmentEntity>>>;
    /// Appointments of a patient, ordered by id.
    fn list_appointments(
        &self,
        patient_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<AppointmentEntity>>>;
    /// Remove an appointment. Returns `false` when it did not exist.
    fn delete_appointment(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert or replace a note.
    fn save_note(&self, note: MedicalNoteEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a note by id.
    fn find_note(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<MedicalNoteEntity>>>;
    /// Notes of a patient, ordered by id.
    fn list_notes(
        &self,
        patient_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<MedicalNoteEntity>>>;
    /// Remove a note. Returns `false` when it did not exist.
    fn delete_note(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert or replace a vital-sign reading.
    fn save_vital(&self, vital: VitalSignEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a reading by id.
    fn find_vital(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<VitalSignEntity>>>;
    /// Readings of a patient, ordered by id.
    fn list_vitals(
        &self,
        patient_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<VitalSignEntity>>>;
    /// Remove a reading. Returns `false` when it did not exist.
    fn delete_vital(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;

    /// Insert or replace a photo record. The file itself lives in upload storage.
    fn save_photo(&self, photo: PhotoEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look up a photo record by id.
    fn find_photo(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PhotoEntity>>>;
    /// Photos of a patient, ordered by id.
    fn list_photos(&self, patient_id: i64) -> BoxFuture<'static, StorageResult<Vec<PhotoEntity>>>;
    /// Remove a photo record. Returns `false` when it did not exist.
    fn delete_photo(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>>;

    /// Cheap round trip proving the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
