use axum::Router;

use crate::state::SharedState;

/// `/patients/{pid}/appointments` and `/appointments/{aid}`.
pub mod appointments;
/// Account routes and the bearer-token extractor.
pub mod auth;
/// Swagger UI and the OpenAPI document.
pub mod docs;
pub mod extract;
/// `/health`.
pub mod health;
/// `/patients/{pid}/notes` and `/notes/{note_id}`.
pub mod notes;
/// `/patients` CRUD.
pub mod patients;
/// Photo upload, listing, deletion and static serving.
pub mod photos;
/// `/patients/{pid}/vitals` and `/vitals/{vital_id}`.
pub mod vitals;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(auth::router())
        .merge(patients::router())
        .merge(appointments::router())
        .merge(notes::router())
        .merge(vitals::router())
        .merge(photos::router(&state))
        .merge(docs::router());

    api_router.with_state(state)
}

#[cfg(test)]
mod tests;
