use tracing::info;

use crate::{
    dao::models::{AppointmentEntity, RecordKind, UserEntity},
    dto::{
        appointment::{AppointmentInput, AppointmentSummary},
        common::OkResponse,
        normalize_optional, parse_rfc3339,
    },
    error::ServiceError,
    services::patient_service::{ensure_record_owner, owned_patient},
    state::SharedState,
};

fn apply_input(
    appointment: &mut AppointmentEntity,
    input: AppointmentInput,
) -> Result<(), ServiceError> {
    appointment.date = parse_rfc3339(&input.date)
        .ok_or_else(|| ServiceError::InvalidInput("expected an RFC 3339 date-time".into()))?;
    appointment.reason = normalize_optional(input.reason);
    appointment.status = input.status.into();
    appointment.notes = normalize_optional(input.notes);
    Ok(())
}

async fn owned_appointment(
    state: &SharedState,
    user: &UserEntity,
    appointment_id: i64,
) -> Result<AppointmentEntity, ServiceError> {
    let store = state.require_med_store().await?;
    let appointment = store
        .find_appointment(appointment_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("appointment not found".into()))?;
    ensure_record_owner(&store, user.id, appointment.patient_id).await?;
    Ok(appointment)
}

/// Appointments of an owned patient.
pub async fn list_appointments(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
) -> Result<Vec<AppointmentSummary>, ServiceError> {
    let store = state.require_med_store().await?;
    owned_patient(&store, user.id, patient_id).await?;
    let appointments = store.list_appointments(patient_id).await?;
    Ok(appointments
        .into_iter()
        .map(AppointmentSummary::from)
        .collect())
}

/// Book an appointment for an owned patient.
pub async fn create_appointment(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
    input: AppointmentInput,
) -> Result<AppointmentSummary, ServiceError> {
    let store = state.require_med_store().await?;
    owned_patient(&store, user.id, patient_id).await?;

    let mut appointment = AppointmentEntity {
        id: 0,
        patient_id,
        date: std::time::SystemTime::UNIX_EPOCH,
        reason: None,
        status: Default::default(),
        notes: None,
    };
    apply_input(&mut appointment, input)?;
    appointment.id = store.next_id(RecordKind::Appointments).await?;
    store.save_appointment(appointment.clone()).await?;

    info!(patient_id, appointment_id = appointment.id, "created appointment");
    Ok(appointment.into())
}

/// Replace an appointment. Appointments of other users yield 403.
pub async fn update_appointment(
    state: &SharedState,
    user: &UserEntity,
    appointment_id: i64,
    input: AppointmentInput,
) -> Result<AppointmentSummary, ServiceError> {
    let mut appointment = owned_appointment(state, user, appointment_id).await?;
    apply_input(&mut appointment, input)?;

    let store = state.require_med_store().await?;
    store.save_appointment(appointment.clone()).await?;
    info!(appointment_id, "updated appointment");
    Ok(appointment.into())
}

/// Remove an appointment. Appointments of other users yield 403.
pub async fn delete_appointment(
    state: &SharedState,
    user: &UserEntity,
    appointment_id: i64,
) -> Result<OkResponse, ServiceError> {
    owned_appointment(state, user, appointment_id).await?;
    let store = state.require_med_store().await?;
    if !store.delete_appointment(appointment_id).await? {
        return Err(ServiceError::NotFound("appointment not found".into()));
    }
    info!(appointment_id, "deleted appointment");
    Ok(OkResponse::ok())
}
