use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Kinds of records persisted by the storage layer. Each kind has its own
/// collection and its own identifier sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Registered clinicians.
    Users,
    /// Patients owned by a user.
    Patients,
    /// Appointments attached to a patient.
    Appointments,
    /// Free-text medical notes attached to a patient.
    Notes,
    /// Vital-sign readings attached to a patient.
    Vitals,
    /// Photos attached to a patient.
    Photos,
}

impl RecordKind {
    /// Every record kind, in a stable order.
    pub const ALL: [RecordKind; 6] = [
        RecordKind::Users,
        RecordKind::Patients,
        RecordKind::Appointments,
        RecordKind::Notes,
        RecordKind::Vitals,
        RecordKind::Photos,
    ];

    /// Collection name used by document stores.
    pub fn collection(self) -> &'static str {
        match self {
            RecordKind::Users => "users",
            RecordKind::Patients => "patients",
            RecordKind::Appointments => "appointments",
            RecordKind::Notes => "medical_notes",
            RecordKind::Vitals => "vital_signs",
            RecordKind::Photos => "photos",
        }
    }

    /// Position of the kind inside [`RecordKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Registered user able to log in and own patients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Sequential identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Login e-mail, unique across users.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Registration timestamp.
    pub created_at: SystemTime,
}

/// Patient record owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientEntity {
    /// Sequential identifier.
    pub id: i64,
    /// Identifier of the owning user.
    pub user_id: i64,
    /// Full name, used by the search filter.
    pub name: String,
    /// Birth date formatted as `YYYY-MM-DD`.
    pub birth_date: Option<String>,
    /// Free-form gender.
    pub gender: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Contact e-mail.
    pub email: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Known allergies.
    pub allergies: Option<String>,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Lifecycle of an appointment.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Planned and not yet held.
    #[default]
    Scheduled,
    /// Held.
    Completed,
    /// Called off.
    Cancelled,
}

/// Appointment for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentEntity {
    /// Sequential identifier.
    pub id: i64,
    /// Patient the appointment belongs to.
    pub patient_id: i64,
    /// Scheduled date and time.
    pub date: SystemTime,
    /// Reason for the visit.
    pub reason: Option<String>,
    /// Current status.
    pub status: AppointmentStatus,
    /// Extra remarks.
    pub notes: Option<String>,
}

/// Free-text clinical note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicalNoteEntity {
    /// Sequential identifier.
    pub id: i64,
    /// Patient the note belongs to.
    pub patient_id: i64,
    /// Note body.
    pub text: String,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Single vital-sign reading. Every measurement is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalSignEntity {
    /// Sequential identifier.
    pub id: i64,
    /// Patient the reading belongs to.
    pub patient_id: i64,
    /// Blood pressure as `SYS/DIA` in mmHg.
    pub blood_pressure: Option<String>,
    /// Beats per minute.
    pub heart_rate: Option<i32>,
    /// Body temperature in °C.
    pub temperature: Option<f64>,
    /// Breaths per minute.
    pub respiratory_rate: Option<i32>,
    /// SpO2 percentage.
    pub oxygen_saturation: Option<f64>,
    /// Weight in kg.
    pub weight: Option<f64>,
    /// Height in cm.
    pub height: Option<f64>,
    /// When the reading was taken.
    pub recorded_at: SystemTime,
}

/// Uploaded image attached to a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhotoEntity {
    /// Sequential identifier.
    pub id: i64,
    /// Patient the photo belongs to.
    pub patient_id: i64,
    /// Public URL, `/uploads/<file>` for locally stored files.
    pub url: String,
    /// Optional caption.
    pub caption: Option<String>,
    /// Upload timestamp.
    pub created_at: SystemTime,
}
