use std::time::SystemTime;

use tracing::info;

use crate::{
    dao::models::{RecordKind, UserEntity, VitalSignEntity},
    dto::{
        common::OkResponse,
        vital::{VitalSignInput, VitalSignSummary},
    },
    error::ServiceError,
    services::patient_service::{ensure_record_owner, owned_patient},
    state::SharedState,
};

async fn owned_vital(
    state: &SharedState,
    user: &UserEntity,
    vital_id: i64,
) -> Result<VitalSignEntity, ServiceError> {
    let store = state.require_med_store().await?;
    let vital = store
        .find_vital(vital_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("vital sign not found".into()))?;
    ensure_record_owner(&store, user.id, vital.patient_id).await?;
    Ok(vital)
}

/// Readings of an owned patient.
pub async fn list_vitals(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
) -> Result<Vec<VitalSignSummary>, ServiceError> {
    let store = state.require_med_store().await?;
    owned_patient(&store, user.id, patient_id).await?;
    let vitals = store.list_vitals(patient_id).await?;
    Ok(vitals.into_iter().map(VitalSignSummary::from).collect())
}

/// Record a reading. Without `recorded_at` the current time is used.
pub async fn create_vital(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
    input: VitalSignInput,
) -> Result<VitalSignSummary, ServiceError> {
    let store = state.require_med_store().await?;
    owned_patient(&store, user.id, patient_id).await?;

    let now = SystemTime::now();
    let mut vital = VitalSignEntity {
        id: store.next_id(RecordKind::Vitals).await?,
        patient_id,
        blood_pressure: None,
        heart_rate: None,
        temperature: None,
        respiratory_rate: None,
        oxygen_saturation: None,
        weight: None,
        height: None,
        recorded_at: now,
    };
    input.apply_to(&mut vital, now);
    store.save_vital(vital.clone()).await?;

    info!(patient_id, vital_id = vital.id, "recorded vital signs");
    Ok(vital.into())
}

/// Replace the measurements of a reading. Without `recorded_at` the previous time is kept.
pub async fn update_vital(
    state: &SharedState,
    user: &UserEntity,
    vital_id: i64,
    input: VitalSignInput,
) -> Result<VitalSignSummary, ServiceError> {
    let mut vital = owned_vital(state, user, vital_id).await?;
    let previous = vital.recorded_at;
    input.apply_to(&mut vital, previous);

    let store = state.require_med_store().await?;
    store.save_vital(vital.clone()).await?;
    info!(vital_id, "updated vital signs");
    Ok(vital.into())
}

/// Remove a reading. Readings of other users yield 403.
pub async fn delete_vital(
    state: &SharedState,
    user: &UserEntity,
    vital_id: i64,
) -> Result<OkResponse, ServiceError> {
    owned_vital(state, user, vital_id).await?;
    let store = state.require_med_store().await?;
    if !store.delete_vital(vital_id).await? {
        return Err(ServiceError::NotFound("vital sign not found".into()));
    }
    info!(vital_id, "deleted vital signs");
    Ok(OkResponse::ok())
}
