use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{AppointmentEntity, AppointmentStatus},
    dto::{format_system_time, validation::validate_rfc3339},
};

/// Appointment status as exposed over the API.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatusDto {
    /// Planned and not yet held.
    #[default]
    Scheduled,
    /// Held.
    Completed,
    /// Called off.
    Cancelled,
}

impl From<AppointmentStatusDto> for AppointmentStatus {
    fn from(value: AppointmentStatusDto) -> Self {
        match value {
            AppointmentStatusDto::Scheduled => AppointmentStatus::Scheduled,
            AppointmentStatusDto::Completed => AppointmentStatus::Completed,
            AppointmentStatusDto::Cancelled => AppointmentStatus::Cancelled,
        }
    }
}

impl From<AppointmentStatus> for AppointmentStatusDto {
    fn from(value: AppointmentStatus) -> Self {
        match value {
            AppointmentStatus::Scheduled => AppointmentStatusDto::Scheduled,
            AppointmentStatus::Completed => AppointmentStatusDto::Completed,
            AppointmentStatus::Cancelled => AppointmentStatusDto::Cancelled,
        }
    }
}

/// Appointment fields supplied on creation and update.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct AppointmentInput {
    /// RFC 3339 date-time, e.g. `2024-05-01T09:30:00Z`.
    #[validate(custom(function = "validate_rfc3339"))]
    pub date: String,
    /// Reason for the visit.
    #[serde(default, deserialize_with = "crate::dto::blank_as_none")]
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    /// Defaults to `scheduled`.
    #[serde(default)]
    pub status: AppointmentStatusDto,
    /// Free-text notes.
    #[serde(default, deserialize_with = "crate::dto::blank_as_none")]
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Appointment as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentSummary {
    /// Appointment identifier.
    pub id: i64,
    /// Patient the appointment belongs to.
    pub patient_id: i64,
    /// RFC 3339, normalised to UTC.
    pub date: String,
    /// Reason for the visit.
    pub reason: Option<String>,
    /// Current lifecycle state.
    pub status: AppointmentStatusDto,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl From<AppointmentEntity> for AppointmentSummary {
    fn from(appointment: AppointmentEntity) -> Self {
        Self {
            id: appointment.id,
            patient_id: appointment.patient_id,
            date: format_system_time(appointment.date),
            reason: appointment.reason,
            status: appointment.status.into(),
            notes: appointment.notes,
        }
    }
}
