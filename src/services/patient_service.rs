use std::{sync::Arc, time::SystemTime};

use tracing::{info, warn};

use crate::{
    dao::{
        med_store::MedStore,
        models::{PatientEntity, RecordKind, UserEntity},
    },
    dto::{
        common::OkResponse,
        patient::{PatientInput, PatientSummary},
    },
    error::ServiceError,
    state::SharedState,
};

/// Fetch a patient owned by `user_id`. Patients of other users are reported as missing.
pub(crate) async fn owned_patient(
    store: &Arc<dyn MedStore>,
    user_id: i64,
    patient_id: i64,
) -> Result<PatientEntity, ServiceError> {
    match store.find_patient(patient_id).await? {
        Some(patient) if patient.user_id == user_id => Ok(patient),
        _ => Err(ServiceError::NotFound("patient not found".into())),
    }
}

/// Check that the patient a record belongs to is owned by `user_id`.
/// Used once the record itself is known to exist, hence 403 rather than 404.
pub(crate) async fn ensure_record_owner(
    store: &Arc<dyn MedStore>,
    user_id: i64,
    patient_id: i64,
) -> Result<(), ServiceError> {
    match store.find_patient(patient_id).await? {
        Some(patient) if patient.user_id == user_id => Ok(()),
        _ => Err(ServiceError::Forbidden("not allowed".into())),
    }
}

/// Patients owned by `user`, optionally filtered by a name fragment.
pub async fn list_patients(
    state: &SharedState,
    user: &UserEntity,
    search: Option<String>,
) -> Result<Vec<PatientSummary>, ServiceError> {
    let store = state.require_med_store().await?;
    let search = search
        .map(|term| term.trim().to_owned())
        .filter(|term| !term.is_empty());
    let patients = store.list_patients(user.id, search).await?;
    Ok(patients.into_iter().map(PatientSummary::from).collect())
}

/// Create a patient owned by `user`.
pub async fn create_patient(
    state: &SharedState,
    user: &UserEntity,
    input: PatientInput,
) -> Result<PatientSummary, ServiceError> {
    let store = state.require_med_store().await?;
    let mut patient = PatientEntity {
        id: store.next_id(RecordKind::Patients).await?,
        user_id: user.id,
        name: String::new(),
        birth_date: None,
        gender: None,
        phone: None,
        email: None,
        address: None,
        allergies: None,
        created_at: SystemTime::now(),
    };
    input.apply_to(&mut patient);
    store.save_patient(patient.clone()).await?;

    info!(user_id = user.id, patient_id = patient.id, "created patient");
    Ok(patient.into())
}

/// Fetch an owned patient. Foreign patients are reported as 404.
pub async fn get_patient(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
) -> Result<PatientSummary, ServiceError> {
    let store = state.require_med_store().await?;
    Ok(owned_patient(&store, user.id, patient_id).await?.into())
}

/// Replace every editable field of the patient.
pub async fn update_patient(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
    input: PatientInput,
) -> Result<PatientSummary, ServiceError> {
    let store = state.require_med_store().await?;
    let mut patient = owned_patient(&store, user.id, patient_id).await?;
    input.apply_to(&mut patient);
    store.save_patient(patient.clone()).await?;

    info!(user_id = user.id, patient_id, "updated patient");
    Ok(patient.into())
}

/// Delete the patient, its records, and the files of its photos.
pub async fn delete_patient(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
) -> Result<OkResponse, ServiceError> {
    let store = state.require_med_store().await?;
    owned_patient(&store, user.id, patient_id).await?;

    let photos = store.list_photos(patient_id).await?;
    if !store.delete_patient(patient_id).await? {
        return Err(ServiceError::NotFound("patient not found".into()));
    }

    for photo in photos {
        if let Err(err) = state.uploads().remove_by_url(&photo.url).await {
            warn!(patient_id, photo_id = photo.id, error = %err, "failed to remove photo file");
        }
    }

    info!(user_id = user.id, patient_id, "deleted patient");
    Ok(OkResponse::ok())
}
