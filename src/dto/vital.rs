use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::VitalSignEntity,
    dto::{
        format_system_time, normalize_optional, parse_rfc3339,
        validation::{validate_blood_pressure, validate_rfc3339},
    },
};

/// Vital-sign reading as submitted by clients. Every measurement is optional.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct VitalSignInput {
    /// `SYS/DIA` in mmHg, e.g. `120/80`.
    #[serde(default, deserialize_with = "crate::dto::blank_as_none")]
    #[validate(custom(function = "validate_blood_pressure"))]
    pub blood_pressure: Option<String>,
    /// Beats per minute, 20 to 250.
    #[serde(default)]
    #[validate(range(min = 20, max = 250))]
    pub heart_rate: Option<i32>,
    /// Degrees Celsius, 30 to 45.
    #[serde(default)]
    #[validate(range(min = 30.0, max = 45.0))]
    pub temperature: Option<f64>,
    /// Breaths per minute, 5 to 80.
    #[serde(default)]
    #[validate(range(min = 5, max = 80))]
    pub respiratory_rate: Option<i32>,
    /// SpO2 percentage, 50 to 100.
    #[serde(default)]
    #[validate(range(min = 50.0, max = 100.0))]
    pub oxygen_saturation: Option<f64>,
    /// Kilograms, above 0 and at most 500.
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, max = 500.0))]
    pub weight: Option<f64>,
    /// Centimetres, above 0 and at most 300.
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, max = 300.0))]
    pub height: Option<f64>,
    /// RFC 3339 timestamp; the server clock is used when omitted.
    #[serde(default, deserialize_with = "crate::dto::blank_as_none")]
    #[validate(custom(function = "validate_rfc3339"))]
    pub recorded_at: Option<String>,
}

impl VitalSignInput {
    /// Copy the measurements onto `vital`. A missing `recorded_at` keeps `fallback`.
    pub fn apply_to(self, vital: &mut VitalSignEntity, fallback: SystemTime) {
        vital.blood_pressure = normalize_optional(self.blood_pressure)
            .map(|bp| bp.split_whitespace().collect::<String>());
        vital.heart_rate = self.heart_rate;
        vital.temperature = self.temperature;
        vital.respiratory_rate = self.respiratory_rate;
        vital.oxygen_saturation = self.oxygen_saturation;
        vital.weight = self.weight;
        vital.height = self.height;
        vital.recorded_at = self
            .recorded_at
            .as_deref()
            .and_then(parse_rfc3339)
            .unwrap_or(fallback);
    }
}

/// Vital-sign reading as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VitalSignSummary {
    /// Reading identifier.
    pub id: i64,
    /// Patient the reading belongs to.
    pub patient_id: i64,
    /// `SYS/DIA` with whitespace removed.
    pub blood_pressure: Option<String>,
    /// Beats per minute.
    pub heart_rate: Option<i32>,
    /// Degrees Celsius.
    pub temperature: Option<f64>,
    /// Breaths per minute.
    pub respiratory_rate: Option<i32>,
    /// SpO2 percentage.
    pub oxygen_saturation: Option<f64>,
    /// Kilograms.
    pub weight: Option<f64>,
    /// Centimetres.
    pub height: Option<f64>,
    /// RFC 3339 time of the measurement.
    pub recorded_at: String,
}

impl From<VitalSignEntity> for VitalSignSummary {
    fn from(vital: VitalSignEntity) -> Self {
        Self {
            id: vital.id,
            patient_id: vital.patient_id,
            blood_pressure: vital.blood_pressure,
            heart_rate: vital.heart_rate,
            temperature: vital.temperature,
            respiratory_rate: vital.respiratory_rate,
            oxygen_saturation: vital.oxygen_saturation,
            weight: vital.weight,
            height: vital.height,
            recorded_at: format_system_time(vital.recorded_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_are_enforced() {
        let valid = VitalSignInput {
            blood_pressure: Some("120/80".into()),
            heart_rate: Some(72),
            temperature: Some(36.6),
            oxygen_saturation: Some(98.0),
            weight: Some(70.5),
            ..Default::default()
        };
        assert!(valid.validate().is_ok());

        let too_fast = VitalSignInput {
            heart_rate: Some(300),
            ..Default::default()
        };
        assert!(too_fast.validate().is_err());

        let weightless = VitalSignInput {
            weight: Some(0.0),
            ..Default::default()
        };
        assert!(weightless.validate().is_err());

        let bad_pressure = VitalSignInput {
            blood_pressure: Some("80/120".into()),
            ..Default::default()
        };
        assert!(bad_pressure.validate().is_err());
    }

    #[test]
    fn test_empty_reading_is_valid() {
        assert!(VitalSignInput::default().validate().is_ok());
    }
}
