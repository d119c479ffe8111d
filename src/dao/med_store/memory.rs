//! In-process [`MedStore`] backed by concurrent hash maps. Used when no database
//! is configured and by the test-suite.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::{self, BoxFuture};

use crate::dao::{
    med_store::MedStore,
    models::{
        AppointmentEntity, MedicalNoteEntity, PatientEntity, PhotoEntity, RecordKind, UserEntity,
        VitalSignEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Volatile storage; everything is lost when the process exits.
#[derive(Clone, Default)]
pub struct MemoryMedStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    sequences: [AtomicI64; RecordKind::ALL.len()],
    users: DashMap<i64, UserEntity>,
    emails: DashMap<String, i64>,
    patients: DashMap<i64, PatientEntity>,
    appointments: DashMap<i64, AppointmentEntity>,
    notes: DashMap<i64, MedicalNoteEntity>,
    vitals: DashMap<i64, VitalSignEntity>,
    photos: DashMap<i64, PhotoEntity>,
}

impl MemoryMedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn ready<T: Send + 'static>(value: StorageResult<T>) -> BoxFuture<'static, StorageResult<T>> {
    Box::pin(future::ready(value))
}

/// Collect the rows accepted by `keep`, ordered by identifier.
fn collect_sorted<T: Clone>(table: &DashMap<i64, T>, keep: impl Fn(&T) -> bool) -> Vec<T> {
    let mut rows = table
        .iter()
        .filter(|entry| keep(entry.value()))
        .map(|entry| (*entry.key(), entry.value().clone()))
        .collect::<Vec<_>>();
    rows.sort_unstable_by_key(|(id, _)| *id);
    rows.into_iter().map(|(_, row)| row).collect()
}

impl MedStore for MemoryMedStore {
    fn next_id(&self, kind: RecordKind) -> BoxFuture<'static, StorageResult<i64>> {
        let id = self.inner.sequences[kind.index()].fetch_add(1, Ordering::SeqCst) + 1;
        ready(Ok(id))
    }

    fn create_user(&self, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let result = match self.inner.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StorageError::duplicate(format!(
                "e-mail `{}` already registered",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.inner.users.insert(user.id, user);
                Ok(())
            }
        };
        ready(result)
    }

    fn find_user(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        ready(Ok(self.inner.users.get(&id).map(|user| user.clone())))
    }

    fn find_user_by_email(
        &self,
        email: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let user = self
            .inner
            .emails
            .get(&email)
            .and_then(|id| self.inner.users.get(id.value()).map(|user| user.clone()));
        ready(Ok(user))
    }

    fn list_users(&self) -> BoxFuture<'static, StorageResult<Vec<UserEntity>>> {
        ready(Ok(collect_sorted(&self.inner.users, |_| true)))
    }

    fn save_patient(&self, patient: PatientEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.patients.insert(patient.id, patient);
        ready(Ok(()))
    }

    fn find_patient(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PatientEntity>>> {
        ready(Ok(self.inner.patients.get(&id).map(|p| p.clone())))
    }

    fn list_patients(
        &self,
        user_id: i64,
        search: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<PatientEntity>>> {
        let needle = search.map(|term| term.to_lowercase());
        let patients = collect_sorted(&self.inner.patients, |patient| {
            patient.user_id == user_id
                && needle
                    .as_deref()
                    .is_none_or(|needle| patient.name.to_lowercase().contains(needle))
        });
        ready(Ok(patients))
    }

    fn delete_patient(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        let removed = self.inner.patients.remove(&id).is_some();
        if removed {
            self.inner.appointments.retain(|_, a| a.patient_id != id);
            self.inner.notes.retain(|_, n| n.patient_id != id);
            self.inner.vitals.retain(|_, v| v.patient_id != id);
            self.inner.photos.retain(|_, p| p.patient_id != id);
        }
        ready(Ok(removed))
    }

    fn save_appointment(
        &self,
        appointment: AppointmentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.appointments.insert(appointment.id, appointment);
        ready(Ok(()))
    }

    fn find_appointment(
        &self,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<AppointmentEntity>>> {
        ready(Ok(self.inner.appointments.get(&id).map(|a| a.clone())))
    }

    fn list_appointments(
        &self,
        patient_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<AppointmentEntity>>> {
        ready(Ok(collect_sorted(&self.inner.appointments, |a| {
            a.patient_id == patient_id
        })))
    }

    fn delete_appointment(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        ready(Ok(self.inner.appointments.remove(&id).is_some()))
    }

    fn save_note(&self, note: MedicalNoteEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.notes.insert(note.id, note);
        ready(Ok(()))
    }

    fn find_note(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<MedicalNoteEntity>>> {
        ready(Ok(self.inner.notes.get(&id).map(|n| n.clone())))
    }

    fn list_notes(
        &self,
        patient_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<MedicalNoteEntity>>> {
        ready(Ok(collect_sorted(&self.inner.notes, |n| {
            n.patient_id == patient_id
        })))
    }

    fn delete_note(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        ready(Ok(self.inner.notes.remove(&id).is_some()))
    }

    fn save_vital(&self, vital: VitalSignEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.vitals.insert(vital.id, vital);
        ready(Ok(()))
    }

    fn find_vital(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<VitalSignEntity>>> {
        ready(Ok(self.inner.vitals.get(&id).map(|v| v.clone())))
    }

    fn list_vitals(
        &self,
        patient_id: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<VitalSignEntity>>> {
        ready(Ok(collect_sorted(&self.inner.vitals, |v| {
            v.patient_id == patient_id
        })))
    }

    fn delete_vital(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        ready(Ok(self.inner.vitals.remove(&id).is_some()))
    }

    fn save_photo(&self, photo: PhotoEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.photos.insert(photo.id, photo);
        ready(Ok(()))
    }

    fn find_photo(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PhotoEntity>>> {
        ready(Ok(self.inner.photos.get(&id).map(|p| p.clone())))
    }

    fn list_photos(&self, patient_id: i64) -> BoxFuture<'static, StorageResult<Vec<PhotoEntity>>> {
        ready(Ok(collect_sorted(&self.inner.photos, |p| {
            p.patient_id == patient_id
        })))
    }

    fn delete_photo(&self, id: i64) -> BoxFuture<'static, StorageResult<bool>> {
        ready(Ok(self.inner.photos.remove(&id).is_some()))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        ready(Ok(()))
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        ready(Ok(()))
    }
}
