use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for MedApp Back.
#[openapi(
    info(title = "MedApp API", description = "Clinical records for independent practitioners"),
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::list_users,
        crate::routes::patients::list_patients,
        crate::routes::patients::create_patient,
        crate::routes::patients::get_patient,
        crate::routes::patients::update_patient,
        crate::routes::patients::delete_patient,
        crate::routes::appointments::list_appointments,
        crate::routes::appointments::create_appointment,
        crate::routes::appointments::update_appointment,
        crate::routes::appointments::delete_appointment,
        crate::routes::notes::list_notes,
        crate::routes::notes::create_note,
        crate::routes::notes::update_note,
        crate::routes::notes::delete_note,
        crate::routes::vitals::list_vitals,
        crate::routes::vitals::create_vital,
        crate::routes::vitals::update_vital,
        crate::routes::vitals::delete_vital,
        crate::routes::photos::list_photos,
        crate::routes::photos::upload_photo,
        crate::routes::photos::delete_photo,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::OkResponse,
            crate::dto::auth::RegisterRequest,
            crate::dto::auth::LoginForm,
            crate::dto::auth::TokenResponse,
            crate::dto::auth::UserSummary,
            crate::dto::patient::PatientInput,
            crate::dto::patient::PatientSummary,
            crate::dto::appointment::AppointmentStatusDto,
            crate::dto::appointment::AppointmentInput,
            crate::dto::appointment::AppointmentSummary,
            crate::dto::note::NoteInput,
            crate::dto::note::NoteSummary,
            crate::dto::vital::VitalSignInput,
            crate::dto::vital::VitalSignSummary,
            crate::dto::photo::PhotoUpload,
            crate::dto::photo::PhotoSummary,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Sistema", description = "Service status"),
        (name = "auth", description = "Registration and access tokens"),
        (name = "patients", description = "Patients owned by the caller"),
        (name = "appointments", description = "Patient appointments"),
        (name = "notes", description = "Free-text medical notes"),
        (name = "vitals", description = "Vital-sign readings"),
        (name = "photos", description = "Patient photos and uploaded files"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT scheme referenced by protected routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/auth/register",
            "/auth/login",
            "/users",
            "/patients",
            "/patients/{pid}",
            "/patients/{pid}/appointments",
            "/appointments/{aid}",
            "/patients/{pid}/notes",
            "/notes/{note_id}",
            "/patients/{pid}/vitals",
            "/vitals/{vital_id}",
            "/patients/{pid}/photos",
            "/photos/{photo_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer"));
    }
}
