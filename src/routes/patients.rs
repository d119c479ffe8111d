use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use validator::Validate;

use crate::{
    dto::{
        common::OkResponse,
        patient::{PatientInput, PatientSearchQuery, PatientSummary},
    },
    error::AppError,
    routes::{auth::CurrentUser, extract::{AppJson, AppPath, AppQuery}},
    services::patient_service,
    state::SharedState,
};

/// Patient CRUD, scoped to the authenticated user.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/patients", get(list_patients).post(create_patient))
        .route(
            "/patients/{pid}",
            get(get_patient).put(update_patient).delete(delete_patient),
        )
}

/// List the caller's patients, optionally filtered by name.
#[utoipa::path(
    get,
    path = "/patients",
    tag = "patients",
    params(PatientSearchQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Owned patients ordered by id", body = [PatientSummary]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_patients(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppQuery(query): AppQuery<PatientSearchQuery>,
) -> Result<Json<Vec<PatientSummary>>, AppError> {
    Ok(Json(
        patient_service::list_patients(&state, &user, query.search).await?,
    ))
}

/// Create a patient owned by the caller.
#[utoipa::path(
    post,
    path = "/patients",
    tag = "patients",
    request_body = PatientInput,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Patient created", body = PatientSummary),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn create_patient(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppJson(payload): AppJson<PatientInput>,
) -> Result<(StatusCode, Json<PatientSummary>), AppError> {
    payload.validate()?;
    let patient = patient_service::create_patient(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// Fetch one patient.
#[utoipa::path(
    get,
    path = "/patients/{pid}",
    tag = "patients",
    params(("pid" = i64, Path, description = "Patient identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Patient", body = PatientSummary),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn get_patient(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
) -> Result<Json<PatientSummary>, AppError> {
    Ok(Json(patient_service::get_patient(&state, &user, pid).await?))
}

/// Replace the editable fields of a patient.
#[utoipa::path(
    put,
    path = "/patients/{pid}",
    tag = "patients",
    params(("pid" = i64, Path, description = "Patient identifier")),
    request_body = PatientInput,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated patient", body = PatientSummary),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn update_patient(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
    AppJson(payload): AppJson<PatientInput>,
) -> Result<Json<PatientSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        patient_service::update_patient(&state, &user, pid, payload).await?,
    ))
}

/// Delete a patient along with its appointments, notes, vitals and photos.
#[utoipa::path(
    delete,
    path = "/patients/{pid}",
    tag = "patients",
    params(("pid" = i64, Path, description = "Patient identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Patient deleted", body = OkResponse),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn delete_patient(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
) -> Result<Json<OkResponse>, AppError> {
    Ok(Json(
        patient_service::delete_patient(&state, &user, pid).await?,
    ))
}
