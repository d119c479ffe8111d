use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::{
    AppointmentEntity, AppointmentStatus, MedicalNoteEntity, PatientEntity, PhotoEntity,
    UserEntity, VitalSignEntity,
};

/// Filter matching a document by its numeric `_id`.
pub fn doc_id(id: i64) -> Document {
    doc! {"_id": id}
}

/// Counter document backing sequential ids (`_id` is the collection name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCounterDocument {
    /// Collection the sequence belongs to.
    #[serde(rename = "_id")]
    pub name: String,
    /// Last identifier handed out.
    pub seq: i64,
}

/// Stored form of [`UserEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUserDocument {
    #[serde(rename = "_id")]
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime,
}

impl From<UserEntity> for MongoUserDocument {
    fn from(value: UserEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            password_hash: value.password_hash,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoUserDocument> for UserEntity {
    fn from(value: MongoUserDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
            password_hash: value.password_hash,
            created_at: value.created_at.to_system_time(),
        }
    }
}

/// Stored form of [`PatientEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPatientDocument {
    #[serde(rename = "_id")]
    id: i64,
    user_id: i64,
    name: String,
    birth_date: Option<String>,
    gender: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    allergies: Option<String>,
    created_at: DateTime,
}

impl From<PatientEntity> for MongoPatientDocument {
    fn from(value: PatientEntity) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            name: value.name,
            birth_date: value.birth_date,
            gender: value.gender,
            phone: value.phone,
            email: value.email,
            address: value.address,
            allergies: value.allergies,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoPatientDocument> for PatientEntity {
    fn from(value: MongoPatientDocument) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            name: value.name,
            birth_date: value.birth_date,
            gender: value.gender,
            phone: value.phone,
            email: value.email,
            address: value.address,
            allergies: value.allergies,
            created_at: value.created_at.to_system_time(),
        }
    }
}

/// Stored form of [`AppointmentEntity`]. Older documents without `status` read as scheduled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoAppointmentDocument {
    #[serde(rename = "_id")]
    id: i64,
    patient_id: i64,
    date: DateTime,
    reason: Option<String>,
    #[serde(default)]
    status: AppointmentStatus,
    notes: Option<String>,
}

impl From<AppointmentEntity> for MongoAppointmentDocument {
    fn from(value: AppointmentEntity) -> Self {
        Self {
            id: value.id,
            patient_id: value.patient_id,
            date: DateTime::from_system_time(value.date),
            reason: value.reason,
            status: value.status,
            notes: value.notes,
        }
    }
}

impl From<MongoAppointmentDocument> for AppointmentEntity {
    fn from(value: MongoAppointmentDocument) -> Self {
        Self {
            id: value.id,
            patient_id: value.patient_id,
            date: value.date.to_system_time(),
            reason: value.reason,
            status: value.status,
            notes: value.notes,
        }
    }
}

/// Stored form of [`MedicalNoteEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoNoteDocument {
    #[serde(rename = "_id")]
    id: i64,
    patient_id: i64,
    text: String,
    created_at: DateTime,
}

impl From<MedicalNoteEntity> for MongoNoteDocument {
    fn from(value: MedicalNoteEntity) -> Self {
        Self {
            id: value.id,
            patient_id: value.patient_id,
            text: value.text,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoNoteDocument> for MedicalNoteEntity {
    fn from(value: MongoNoteDocument) -> Self {
        Self {
            id: value.id,
            patient_id: value.patient_id,
            text: value.text,
            created_at: value.created_at.to_system_time(),
        }
    }
}

/// Stored form of [`VitalSignEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoVitalDocument {
    #[serde(rename = "_id")]
    id: i64,
    patient_id: i64,
    blood_pressure: Option<String>,
    heart_rate: Option<i32>,
    temperature: Option<f64>,
    respiratory_rate: Option<i32>,
    oxygen_saturation: Option<f64>,
    weight: Option<f64>,
    height: Option<f64>,
    recorded_at: DateTime,
}

impl From<VitalSignEntity> for MongoVitalDocument {
    fn from(value: VitalSignEntity) -> Self {
        Self {
            id: value.id,
            patient_id: value.patient_id,
            blood_pressure: value.blood_pressure,
            heart_rate: value.heart_rate,
            temperature: value.temperature,
            respiratory_rate: value.respiratory_rate,
            oxygen_saturation: value.oxygen_saturation,
            weight: value.weight,
            height: value.height,
            recorded_at: DateTime::from_system_time(value.recorded_at),
        }
    }
}

impl From<MongoVitalDocument> for VitalSignEntity {
    fn from(value: MongoVitalDocument) -> Self {
        Self {
            id: value.id,
            patient_id: value.patient_id,
            blood_pressure: value.blood_pressure,
            heart_rate: value.heart_rate,
            temperature: value.temperature,
            respiratory_rate: value.respiratory_rate,
            oxygen_saturation: value.oxygen_saturation,
            weight: value.weight,
            height: value.height,
            recorded_at: value.recorded_at.to_system_time(),
        }
    }
}

/// Stored form of [`PhotoEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPhotoDocument {
    #[serde(rename = "_id")]
    id: i64,
    patient_id: i64,
    url: String,
    caption: Option<String>,
    created_at: DateTime,
}

impl From<PhotoEntity> for MongoPhotoDocument {
    fn from(value: PhotoEntity) -> Self {
        Self {
            id: value.id,
            patient_id: value.patient_id,
            url: value.url,
            caption: value.caption,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoPhotoDocument> for PhotoEntity {
    fn from(value: MongoPhotoDocument) -> Self {
        Self {
            id: value.id,
            patient_id: value.patient_id,
            url: value.url,
            caption: value.caption,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use mongodb::bson::{deserialize_from_document, serialize_to_document};
    use serde::de::DeserializeOwned;

    use super::*;

    // bson dates only keep milliseconds.
    fn at(millis: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(millis)
    }

    /// Entity -> document -> bson -> document -> entity.
    fn through_bson<E, D>(entity: E) -> (Document, E)
    where
        D: From<E> + Serialize + DeserializeOwned,
        E: From<D>,
    {
        let document = serialize_to_document(&D::from(entity)).unwrap();
        let decoded: D = deserialize_from_document(document.clone()).unwrap();
        (document, E::from(decoded))
    }

    #[test]
    fn test_user_roundtrip() {
        let user = UserEntity {
            id: 3,
            name: "Dr. Ruiz".into(),
            email: "ruiz@clinic.example".into(),
            password_hash: "$argon2id$v=19$stub".into(),
            created_at: at(1_714_555_800_123),
        };
        let (document, decoded) = through_bson::<_, MongoUserDocument>(user.clone());
        assert_eq!(document.get_i64("_id").unwrap(), 3);
        assert!(document.get("id").is_none());
        assert_eq!(decoded, user);
    }

    #[test]
    fn test_patient_roundtrip_keeps_missing_fields() {
        let patient = PatientEntity {
            id: 7,
            user_id: 3,
            name: "María López".into(),
            birth_date: Some("1985-04-12".into()),
            gender: None,
            phone: Some("555-0101".into()),
            email: None,
            address: None,
            allergies: Some("penicillin".into()),
            created_at: at(1_700_000_000_000),
        };
        let (document, decoded) = through_bson::<_, MongoPatientDocument>(patient.clone());
        assert_eq!(document.get_i64("user_id").unwrap(), 3);
        assert_eq!(decoded, patient);
    }

    #[test]
    fn test_appointment_roundtrip() {
        let appointment = AppointmentEntity {
            id: 11,
            patient_id: 7,
            date: at(1_714_555_800_000),
            reason: Some("checkup".into()),
            status: AppointmentStatus::Completed,
            notes: None,
        };
        let (document, decoded) =
            through_bson::<_, MongoAppointmentDocument>(appointment.clone());
        assert_eq!(document.get_str("status").unwrap(), "completed");
        assert!(document.get_datetime("date").is_ok());
        assert_eq!(decoded, appointment);
    }

    #[test]
    fn test_appointment_without_status_defaults_to_scheduled() {
        let document = doc! {
            "_id": 12_i64,
            "patient_id": 7_i64,
            "date": DateTime::from_millis(1_714_555_800_000),
            "reason": null,
            "notes": null,
        };
        let decoded: MongoAppointmentDocument = deserialize_from_document(document).unwrap();
        let appointment = AppointmentEntity::from(decoded);
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
        assert_eq!(appointment.date, at(1_714_555_800_000));
    }

    #[test]
    fn test_note_vital_and_photo_roundtrip() {
        let note = MedicalNoteEntity {
            id: 1,
            patient_id: 7,
            text: "Reports mild headache.".into(),
            created_at: at(1_710_000_000_456),
        };
        let (_, decoded) = through_bson::<_, MongoNoteDocument>(note.clone());
        assert_eq!(decoded, note);

        let vital = VitalSignEntity {
            id: 2,
            patient_id: 7,
            blood_pressure: Some("120/80".into()),
            heart_rate: Some(72),
            temperature: Some(36.8),
            respiratory_rate: None,
            oxygen_saturation: Some(98.5),
            weight: Some(70.25),
            height: None,
            recorded_at: at(1_710_072_000_000),
        };
        let (_, decoded) = through_bson::<_, MongoVitalDocument>(vital.clone());
        assert_eq!(decoded, vital);

        let photo = PhotoEntity {
            id: 4,
            patient_id: 7,
            url: "/uploads/0b5f.jpg".into(),
            caption: Some("left arm".into()),
            created_at: at(1_710_000_001_000),
        };
        let (document, decoded) = through_bson::<_, MongoPhotoDocument>(photo.clone());
        assert_eq!(document.get_str("url").unwrap(), "/uploads/0b5f.jpg");
        assert_eq!(decoded, photo);
    }
}
