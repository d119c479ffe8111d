/// Appointment management for owned patients.
pub mod appointment_service;
/// Registration, login and access tokens.
pub mod auth_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Medical notes attached to patients.
pub mod note_service;
/// Patient CRUD and ownership checks.
pub mod patient_service;
/// Photo uploads and deletion.
pub mod photo_service;
/// Background storage connection and degraded-mode handling.
pub mod storage_supervisor;
/// Local file storage for uploaded photos.
pub mod upload_storage;
/// Vital-sign readings attached to patients.
pub mod vital_service;
