use axum::http::{StatusCode, header};
use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{
    build_router,
    config::AppConfig,
    dto::{
        appointment::AppointmentSummary, auth::TokenResponse, common::OkResponse,
        health::HealthResponse, note::NoteSummary, patient::PatientSummary, photo::PhotoSummary,
        vital::VitalSignSummary,
    },
    in_memory_state,
    state::SharedState,
};

const MAX_UPLOAD: usize = 1024;

struct Harness {
    server: TestServer,
    state: SharedState,
    uploads: TempDir,
}

async fn harness() -> Harness {
    let uploads = tempfile::tempdir().unwrap();
    let config = AppConfig {
        secret_key: "integration-secret".into(),
        upload_dir: uploads.path().to_path_buf(),
        max_upload_bytes: MAX_UPLOAD,
        ..AppConfig::default()
    };
    let state = in_memory_state(config).await;
    let server = TestServer::new(build_router(state.clone())).unwrap();
    Harness {
        server,
        state,
        uploads,
    }
}

impl Harness {
    async fn register(&self, name: &str, email: &str, password: &str) -> axum_test::TestResponse {
        self.server
            .post("/auth/register")
            .json(&json!({ "name": name, "email": email, "password": password }))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> axum_test::TestResponse {
        self.server
            .post("/auth/login")
            .form(&[("username", email), ("password", password)])
            .await
    }

    /// Register then log in, returning the `Authorization` header value.
    async fn bearer(&self, email: &str) -> String {
        self.register("Dr. Test", email, "s3cret-pass")
            .await
            .assert_status(StatusCode::CREATED);
        let token: TokenResponse = self.login(email, "s3cret-pass").await.json();
        format!("Bearer {}", token.access_token)
    }

    async fn create_patient(&self, auth: &str, name: &str) -> PatientSummary {
        let response = self
            .server
            .post("/patients")
            .add_header(header::AUTHORIZATION, auth)
            .json(&json!({ "name": name, "birth_date": "1985-04-12", "allergies": "penicillin" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }
}

#[tokio::test]
async fn test_health_reports_state() {
    let h = harness().await;
    let body: HealthResponse = h.server.get("/health").await.json();
    assert_eq!(body.estado, "activo");

    h.state.update_degraded(true);
    let response = h.server.get("/health").await;
    response.assert_status_ok();
    let body: HealthResponse = response.json();
    assert_eq!(body.estado, "degradado");
}

#[tokio::test]
async fn test_register_and_login() {
    let h = harness().await;

    let response = h.register("Ana", "Ana@Clinic.example", "hunter22").await;
    response.assert_status(StatusCode::CREATED);
    let user: Value = response.json();
    assert_eq!(user["email"], "ana@clinic.example");
    assert!(user.get("password_hash").is_none());

    h.register("Ana again", "ana@clinic.example", "other-pass")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let token: TokenResponse = h.login("ana@clinic.example", "hunter22").await.json();
    assert_eq!(token.token_type, "bearer");
    assert!(!token.access_token.is_empty());

    let rejected = h.login("ana@clinic.example", "wrong").await;
    rejected.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(rejected.header(header::WWW_AUTHENTICATE), "Bearer");
    let body: Value = rejected.json();
    assert_eq!(body["detail"], "invalid credentials");

    h.login("nobody@clinic.example", "hunter22")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let users: Vec<Value> = h.server.get("/users").await.json();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn test_register_rejects_invalid_payloads() {
    let h = harness().await;

    h.register("Ana", "ana@clinic.example", &"x".repeat(73))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    h.register("Ana", "not-an-email", "hunter22")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    h.register("   ", "ana@clinic.example", "hunter22")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let h = harness().await;

    let missing = h.server.get("/patients").await;
    missing.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = missing.json();
    assert_eq!(body["detail"], "not authenticated");

    h.server
        .get("/patients")
        .add_header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_unknown_user_is_rejected() {
    let h = harness().await;
    let token = h.state.tokens().create_access_token(999).unwrap();

    let response = h
        .server
        .get("/patients")
        .add_header(header::AUTHORIZATION, &format!("Bearer {token}"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.header(header::WWW_AUTHENTICATE), "Bearer");
    let body: Value = response.json();
    assert_eq!(body["detail"], "invalid credentials");
}

#[tokio::test]
async fn test_extractor_rejections_are_json() {
    let h = harness().await;
    let auth = h.bearer("doc@clinic.example").await;

    let wrong_type = h
        .server
        .post("/patients")
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "name": 5 }))
        .await;
    wrong_type.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = wrong_type.json();
    assert!(body["detail"].is_string());

    let bad_id = h
        .server
        .get("/patients/abc")
        .add_header(header::AUTHORIZATION, &auth)
        .await;
    bad_id.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = bad_id.json();
    assert!(body["detail"].is_string());

    let no_password = h
        .server
        .post("/auth/login")
        .form(&[("username", "doc@clinic.example")])
        .await;
    no_password.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = no_password.json();
    assert!(body["detail"].is_string());

    let not_json = h
        .server
        .post("/auth/register")
        .text("name=Ana")
        .await;
    not_json.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = not_json.json();
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_register_trims_email_before_validation() {
    let h = harness().await;

    let response = h
        .register("Dr. Spaced", "  Spaced@Clinic.example ", "s3cret-pass")
        .await;
    response.assert_status(StatusCode::CREATED);
    let user: Value = response.json();
    assert_eq!(user["email"], "spaced@clinic.example");

    h.login("spaced@clinic.example", "s3cret-pass")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_blank_optional_patient_fields_are_accepted() {
    let h = harness().await;
    let auth = h.bearer("doc@clinic.example").await;

    let response = h
        .server
        .post("/patients")
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "name": "Blank Fields", "email": "", "birth_date": "", "phone": "  " }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let patient: Value = response.json();
    assert!(patient["email"].is_null());
    assert!(patient["birth_date"].is_null());
    assert!(patient["phone"].is_null());

    h.server
        .post("/patients")
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "name": "Bad Email", "email": "nope" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patient_crud_and_search() {
    let h = harness().await;
    let auth = h.bearer("doc@clinic.example").await;

    let maria = h.create_patient(&auth, "María López").await;
    h.create_patient(&auth, "Juan Pérez").await;
    assert_eq!(maria.birth_date.as_deref(), Some("1985-04-12"));

    let all: Vec<PatientSummary> = h
        .server
        .get("/patients")
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .json();
    assert_eq!(all.len(), 2);
    assert!(all[0].id < all[1].id);

    let found: Vec<PatientSummary> = h
        .server
        .get("/patients")
        .add_query_param("search", "LÓPEZ")
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .json();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, maria.id);

    let updated: PatientSummary = h
        .server
        .put(&format!("/patients/{}", maria.id))
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "name": "María L. Gómez", "phone": "555-0101" }))
        .await
        .json();
    assert_eq!(updated.name, "María L. Gómez");
    assert_eq!(updated.phone.as_deref(), Some("555-0101"));
    // full replacement
    assert_eq!(updated.allergies, None);

    h.server
        .post("/patients")
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "name": "Bad Date", "birth_date": "12/04/1985" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let deleted: OkResponse = h
        .server
        .delete(&format!("/patients/{}", maria.id))
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .json();
    assert!(deleted.ok);

    h.server
        .get(&format!("/patients/{}", maria.id))
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_records_are_scoped_to_owner() {
    let h = harness().await;
    let owner = h.bearer("owner@clinic.example").await;
    let intruder = h.bearer("intruder@clinic.example").await;

    let patient = h.create_patient(&owner, "Private Patient").await;
    let appointment: AppointmentSummary = h
        .server
        .post(&format!("/patients/{}/appointments", patient.id))
        .add_header(header::AUTHORIZATION, &owner)
        .json(&json!({ "date": "2024-05-01T09:30:00Z", "reason": "checkup" }))
        .await
        .json();

    let listed: Vec<PatientSummary> = h
        .server
        .get("/patients")
        .add_header(header::AUTHORIZATION, &intruder)
        .await
        .json();
    assert!(listed.is_empty());

    h.server
        .get(&format!("/patients/{}", patient.id))
        .add_header(header::AUTHORIZATION, &intruder)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    h.server
        .get(&format!("/patients/{}/appointments", patient.id))
        .add_header(header::AUTHORIZATION, &intruder)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    h.server
        .put(&format!("/appointments/{}", appointment.id))
        .add_header(header::AUTHORIZATION, &intruder)
        .json(&json!({ "date": "2024-05-02T09:30:00Z" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    h.server
        .delete(&format!("/appointments/{}", appointment.id))
        .add_header(header::AUTHORIZATION, &intruder)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    h.server
        .delete("/appointments/9999")
        .add_header(header::AUTHORIZATION, &intruder)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_child_records_are_scoped_to_owner() {
    let h = harness().await;
    let owner = h.bearer("owner@clinic.example").await;
    let intruder = h.bearer("intruder@clinic.example").await;
    let patient = h.create_patient(&owner, "Private Patient").await;

    let note: NoteSummary = h
        .server
        .post(&format!("/patients/{}/notes", patient.id))
        .add_header(header::AUTHORIZATION, &owner)
        .json(&json!({ "text": "Confidential." }))
        .await
        .json();
    h.server
        .put(&format!("/notes/{}", note.id))
        .add_header(header::AUTHORIZATION, &intruder)
        .json(&json!({ "text": "Overwritten." }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    h.server
        .delete(&format!("/notes/{}", note.id))
        .add_header(header::AUTHORIZATION, &intruder)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    h.server
        .get(&format!("/patients/{}/notes", patient.id))
        .add_header(header::AUTHORIZATION, &intruder)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let vital: VitalSignSummary = h
        .server
        .post(&format!("/patients/{}/vitals", patient.id))
        .add_header(header::AUTHORIZATION, &owner)
        .json(&json!({ "heart_rate": 70 }))
        .await
        .json();
    h.server
        .put(&format!("/vitals/{}", vital.id))
        .add_header(header::AUTHORIZATION, &intruder)
        .json(&json!({ "heart_rate": 200 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    h.server
        .delete(&format!("/vitals/{}", vital.id))
        .add_header(header::AUTHORIZATION, &intruder)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let form = MultipartForm::new()
        .add_part("file", Part::bytes(b"img".as_slice()).file_name("scan.png"));
    let photo: PhotoSummary = h
        .server
        .post(&format!("/patients/{}/photos", patient.id))
        .add_header(header::AUTHORIZATION, &owner)
        .multipart(form)
        .await
        .json();
    h.server
        .delete(&format!("/photos/{}", photo.id))
        .add_header(header::AUTHORIZATION, &intruder)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    let file_name = photo.url.trim_start_matches("/uploads/");
    assert!(h.uploads.path().join(file_name).exists());

    let notes: Vec<NoteSummary> = h
        .server
        .get(&format!("/patients/{}/notes", patient.id))
        .add_header(header::AUTHORIZATION, &owner)
        .await
        .json();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].text, "Confidential.");

    let vitals: Vec<VitalSignSummary> = h
        .server
        .get(&format!("/patients/{}/vitals", patient.id))
        .add_header(header::AUTHORIZATION, &owner)
        .await
        .json();
    assert_eq!(vitals[0].heart_rate, Some(70));
}

#[tokio::test]
async fn test_appointment_lifecycle() {
    let h = harness().await;
    let auth = h.bearer("doc@clinic.example").await;
    let patient = h.create_patient(&auth, "Luis").await;

    let response = h
        .server
        .post(&format!("/patients/{}/appointments", patient.id))
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "date": "2024-05-01T09:30:00-05:00", "reason": "fever" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["status"], "scheduled");
    assert_eq!(created["date"], "2024-05-01T14:30:00Z");

    let id = created["id"].as_i64().unwrap();
    let updated: AppointmentSummary = h
        .server
        .put(&format!("/appointments/{id}"))
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "date": "2024-05-01T10:00:00Z", "status": "completed", "notes": "resolved" }))
        .await
        .json();
    assert_eq!(updated.notes.as_deref(), Some("resolved"));
    assert_eq!(updated.reason, None);

    h.server
        .post(&format!("/patients/{}/appointments", patient.id))
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "date": "next tuesday" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let deleted: OkResponse = h
        .server
        .delete(&format!("/appointments/{id}"))
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .json();
    assert!(deleted.ok);

    let remaining: Vec<AppointmentSummary> = h
        .server
        .get(&format!("/patients/{}/appointments", patient.id))
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .json();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_notes_and_vitals() {
    let h = harness().await;
    let auth = h.bearer("doc@clinic.example").await;
    let patient = h.create_patient(&auth, "Rosa").await;

    h.server
        .post(&format!("/patients/{}/notes", patient.id))
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "text": "   " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let note: NoteSummary = h
        .server
        .post(&format!("/patients/{}/notes", patient.id))
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "text": "Reports mild headache." }))
        .await
        .json();
    let edited: NoteSummary = h
        .server
        .put(&format!("/notes/{}", note.id))
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "text": "Headache resolved." }))
        .await
        .json();
    assert_eq!(edited.text, "Headache resolved.");
    assert_eq!(edited.created_at, note.created_at);

    h.server
        .post(&format!("/patients/{}/vitals", patient.id))
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "heart_rate": 400 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = h
        .server
        .post(&format!("/patients/{}/vitals", patient.id))
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({
            "blood_pressure": "120 / 80",
            "heart_rate": 72,
            "temperature": 36.8,
            "recorded_at": "2024-03-10T08:00:00Z"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let vital: VitalSignSummary = response.json();
    assert_eq!(vital.blood_pressure.as_deref(), Some("120/80"));
    assert_eq!(vital.recorded_at, "2024-03-10T08:00:00Z");

    let updated: VitalSignSummary = h
        .server
        .put(&format!("/vitals/{}", vital.id))
        .add_header(header::AUTHORIZATION, &auth)
        .json(&json!({ "weight": 68.2 }))
        .await
        .json();
    assert_eq!(updated.weight, Some(68.2));
    assert_eq!(updated.heart_rate, None);
    assert_eq!(updated.recorded_at, "2024-03-10T08:00:00Z");

    let vitals: Vec<VitalSignSummary> = h
        .server
        .get(&format!("/patients/{}/vitals", patient.id))
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .json();
    assert_eq!(vitals.len(), 1);
}

#[tokio::test]
async fn test_photo_upload_serve_and_delete() {
    let h = harness().await;
    let auth = h.bearer("doc@clinic.example").await;
    let patient = h.create_patient(&auth, "Carmen").await;
    let path = format!("/patients/{}/photos", patient.id);

    let form = MultipartForm::new()
        .add_part("file", Part::bytes(b"fake-jpeg".as_slice()).file_name("lesion.JPG"));
    let response = h
        .server
        .post(&path)
        .add_query_param("caption", "left arm")
        .add_header(header::AUTHORIZATION, &auth)
        .multipart(form)
        .await;
    response.assert_status(StatusCode::CREATED);
    let photo: PhotoSummary = response.json();
    assert!(photo.url.starts_with("/uploads/"));
    assert!(photo.url.ends_with(".jpg"));
    assert_eq!(photo.caption.as_deref(), Some("left arm"));

    let served = h.server.get(&photo.url).await;
    served.assert_status_ok();
    assert_eq!(served.as_bytes().as_ref(), b"fake-jpeg");

    let file_name = photo.url.trim_start_matches("/uploads/");
    assert!(h.uploads.path().join(file_name).exists());

    let deleted: OkResponse = h
        .server
        .delete(&format!("/photos/{}", photo.id))
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .json();
    assert!(deleted.ok);
    assert_eq!(deleted.message.as_deref(), Some("photo deleted"));
    assert!(!h.uploads.path().join(file_name).exists());

    h.server
        .delete(&format!("/photos/{}", photo.id))
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_photo_upload_rejections() {
    let h = harness().await;
    let auth = h.bearer("doc@clinic.example").await;
    let patient = h.create_patient(&auth, "Pedro").await;
    let path = format!("/patients/{}/photos", patient.id);

    let no_file = MultipartForm::new().add_text("caption", "nothing attached");
    h.server
        .post(&path)
        .add_header(header::AUTHORIZATION, &auth)
        .multipart(no_file)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let oversized = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; MAX_UPLOAD + 1]).file_name("huge.png"),
    );
    h.server
        .post(&path)
        .add_header(header::AUTHORIZATION, &auth)
        .multipart(oversized)
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    let stored = std::fs::read_dir(h.uploads.path()).unwrap().count();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_patient_delete_removes_photo_files() {
    let h = harness().await;
    let auth = h.bearer("doc@clinic.example").await;
    let patient = h.create_patient(&auth, "Elena").await;

    let form = MultipartForm::new()
        .add_part("file", Part::bytes(b"img".as_slice()).file_name("scan.png"));
    let photo: PhotoSummary = h
        .server
        .post(&format!("/patients/{}/photos", patient.id))
        .add_header(header::AUTHORIZATION, &auth)
        .multipart(form)
        .await
        .json();
    let file_name = photo.url.trim_start_matches("/uploads/").to_owned();
    assert!(h.uploads.path().join(&file_name).exists());

    h.server
        .delete(&format!("/patients/{}", patient.id))
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .assert_status_ok();
    assert!(!h.uploads.path().join(&file_name).exists());
}

#[tokio::test]
async fn test_degraded_mode_returns_503() {
    let h = harness().await;
    let auth = h.bearer("doc@clinic.example").await;

    h.state.update_degraded(true);
    h.server
        .get("/patients")
        .add_header(header::AUTHORIZATION, &auth)
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    h.server
        .post("/auth/login")
        .form(&[("username", "doc@clinic.example"), ("password", "s3cret-pass")])
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let h = harness().await;
    let doc: Value = h.server.get("/api-doc/openapi.json").await.json();
    assert!(doc["paths"]["/patients/{pid}/photos"].is_object());
}
