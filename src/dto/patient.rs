use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    dao::models::PatientEntity,
    dto::{
        format_system_time, normalize_optional,
        validation::{validate_birth_date, validate_not_blank},
    },
};

/// Editable patient fields, used both for creation and full replacement.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct PatientInput {
    /// Full name, at most 200 characters.
    #[validate(length(max = 200), custom(function = "validate_not_blank"))]
    pub name: String,
    /// `YYYY-MM-DD`.
    #[serde(default, deserialize_with = "crate::dto::blank_as_none")]
    #[validate(custom(function = "validate_birth_date"))]
    pub birth_date: Option<String>,
    /// Free text, at most 50 characters.
    #[serde(default, deserialize_with = "crate::dto::blank_as_none")]
    #[validate(length(max = 50))]
    pub gender: Option<String>,
    /// Contact phone, at most 50 characters.
    #[serde(default, deserialize_with = "crate::dto::blank_as_none")]
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    /// Contact e-mail. Blank means none.
    #[serde(default, deserialize_with = "crate::dto::blank_as_none")]
    #[validate(email)]
    pub email: Option<String>,
    /// Postal address, at most 500 characters.
    #[serde(default, deserialize_with = "crate::dto::blank_as_none")]
    #[validate(length(max = 500))]
    pub address: Option<String>,
    /// Known allergies, at most 2000 characters.
    #[serde(default, deserialize_with = "crate::dto::blank_as_none")]
    #[validate(length(max = 2000))]
    pub allergies: Option<String>,
}

impl PatientInput {
    /// Copy the editable fields onto `patient`, trimming text and dropping blanks.
    pub fn apply_to(self, patient: &mut PatientEntity) {
        patient.name = self.name.trim().to_owned();
        patient.birth_date = normalize_optional(self.birth_date);
        patient.gender = normalize_optional(self.gender);
        patient.phone = normalize_optional(self.phone);
        patient.email = normalize_optional(self.email);
        patient.address = normalize_optional(self.address);
        patient.allergies = normalize_optional(self.allergies);
    }
}

/// Query string accepted by the patient listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientSearchQuery {
    /// Case-insensitive fragment of the patient name.
    pub search: Option<String>,
}

/// Patient as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientSummary {
    /// Patient identifier.
    pub id: i64,
    /// Owning user.
    pub user_id: i64,
    /// Full name.
    pub name: String,
    /// `YYYY-MM-DD`.
    pub birth_date: Option<String>,
    /// Free text.
    pub gender: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Contact e-mail.
    pub email: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Known allergies.
    pub allergies: Option<String>,
    /// RFC 3339 creation time.
    pub created_at: String,
}

impl From<PatientEntity> for PatientSummary {
    fn from(patient: PatientEntity) -> Self {
        Self {
            id: patient.id,
            user_id: patient.user_id,
            name: patient.name,
            birth_date: patient.birth_date,
            gender: patient.gender,
            phone: patient.phone,
            email: patient.email,
            address: patient.address,
            allergies: patient.allergies,
            created_at: format_system_time(patient.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_optional_fields_are_dropped_before_validation() {
        let input: PatientInput = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "email": "",
            "birth_date": "   ",
            "phone": " 555-0101 "
        }))
        .unwrap();

        assert!(input.validate().is_ok());
        assert_eq!(input.email, None);
        assert_eq!(input.birth_date, None);
        assert_eq!(input.phone.as_deref(), Some("555-0101"));
    }

    #[test]
    fn test_malformed_email_is_still_rejected() {
        let input: PatientInput = serde_json::from_value(serde_json::json!({
            "name": "Ana",
            "email": "not-an-address"
        }))
        .unwrap();

        assert!(input.validate().is_err());
    }
}
