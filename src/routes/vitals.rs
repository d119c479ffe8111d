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
        vital::{VitalSignInput, VitalSignSummary},
    },
    error::AppError,
    routes::{auth::CurrentUser, extract::{AppJson, AppPath}},
    services::vital_service,
    state::SharedState,
};

/// Vital-sign routes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/patients/{pid}/vitals", get(list_vitals).post(create_vital))
        .route("/vitals/{vital_id}", put(update_vital).delete(delete_vital))
}

/// List the readings of a patient.
#[utoipa::path(
    get,
    path = "/patients/{pid}/vitals",
    tag = "vitals",
    params(("pid" = i64, Path, description = "Patient identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Vital-sign readings of the patient", body = [VitalSignSummary]),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn list_vitals(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
) -> Result<Json<Vec<VitalSignSummary>>, AppError> {
    Ok(Json(vital_service::list_vitals(&state, &user, pid).await?))
}

/// Record a reading. Out-of-range measurements are rejected with 400.
#[utoipa::path(
    post,
    path = "/patients/{pid}/vitals",
    tag = "vitals",
    params(("pid" = i64, Path, description = "Patient identifier")),
    request_body = VitalSignInput,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Reading recorded", body = VitalSignSummary),
        (status = 400, description = "Measurement out of range"),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn create_vital(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
    AppJson(payload): AppJson<VitalSignInput>,
) -> Result<(StatusCode, Json<VitalSignSummary>), AppError> {
    payload.validate()?;
    let vital = vital_service::create_vital(&state, &user, pid, payload).await?;
    Ok((StatusCode::CREATED, Json(vital)))
}

/// Replace a reading.
#[utoipa::path(
    put,
    path = "/vitals/{vital_id}",
    tag = "vitals",
    params(("vital_id" = i64, Path, description = "Reading identifier")),
    request_body = VitalSignInput,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated reading", body = VitalSignSummary),
        (status = 403, description = "Reading belongs to another user"),
        (status = 404, description = "Reading not found")
    )
)]
pub async fn update_vital(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(vital_id): AppPath<i64>,
    AppJson(payload): AppJson<VitalSignInput>,
) -> Result<Json<VitalSignSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        vital_service::update_vital(&state, &user, vital_id, payload).await?,
    ))
}

/// Delete a reading.
#[utoipa::path(
    delete,
    path = "/vitals/{vital_id}",
    tag = "vitals",
    params(("vital_id" = i64, Path, description = "Reading identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Reading deleted", body = OkResponse),
        (status = 403, description = "Reading belongs to another user"),
        (status = 404, description = "Reading not found")
    )
)]
pub async fn delete_vital(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(vital_id): AppPath<i64>,
) -> Result<Json<OkResponse>, AppError> {
    Ok(Json(
        vital_service::delete_vital(&state, &user, vital_id).await?,
    ))
}
