use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, put},
};
use validator::Validate;

use crate::{
    dto::{
        appointment::{AppointmentInput, AppointmentSummary},
        common::OkResponse,
    },
    error::AppError,
    routes::{auth::CurrentUser, extract::{AppJson, AppPath}},
    services::appointment_service,
    state::SharedState,
};

/// Appointment routes, nested under patients for listing and creation.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/patients/{pid}/appointments",
            get(list_appointments).post(create_appointment),
        )
        .route(
            "/appointments/{aid}",
            put(update_appointment).delete(delete_appointment),
        )
}

/// List the appointments of a patient.
#[utoipa::path(
    get,
    path = "/patients/{pid}/appointments",
    tag = "appointments",
    params(("pid" = i64, Path, description = "Patient identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Appointments of the patient", body = [AppointmentSummary]),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn list_appointments(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
) -> Result<Json<Vec<AppointmentSummary>>, AppError> {
    Ok(Json(
        appointment_service::list_appointments(&state, &user, pid).await?,
    ))
}

/// Book an appointment for a patient.
#[utoipa::path(
    post,
    path = "/patients/{pid}/appointments",
    tag = "appointments",
    params(("pid" = i64, Path, description = "Patient identifier")),
    request_body = AppointmentInput,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Appointment created", body = AppointmentSummary),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn create_appointment(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
    AppJson(payload): AppJson<AppointmentInput>,
) -> Result<(StatusCode, Json<AppointmentSummary>), AppError> {
    payload.validate()?;
    let appointment =
        appointment_service::create_appointment(&state, &user, pid, payload).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// Replace the fields of an appointment.
#[utoipa::path(
    put,
    path = "/appointments/{aid}",
    tag = "appointments",
    params(("aid" = i64, Path, description = "Appointment identifier")),
    request_body = AppointmentInput,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated appointment", body = AppointmentSummary),
        (status = 403, description = "Appointment belongs to another user"),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn update_appointment(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(aid): AppPath<i64>,
    AppJson(payload): AppJson<AppointmentInput>,
) -> Result<Json<AppointmentSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        appointment_service::update_appointment(&state, &user, aid, payload).await?,
    ))
}

/// Cancel an appointment.
#[utoipa::path(
    delete,
    path = "/appointments/{aid}",
    tag = "appointments",
    params(("aid" = i64, Path, description = "Appointment identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Appointment deleted", body = OkResponse),
        (status = 403, description = "Appointment belongs to another user"),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn delete_appointment(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(aid): AppPath<i64>,
) -> Result<Json<OkResponse>, AppError> {
    Ok(Json(
        appointment_service::delete_appointment(&state, &user, aid).await?,
    ))
}
