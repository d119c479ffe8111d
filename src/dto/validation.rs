//! Validation helpers for DTOs.

use time::{Date, macros::format_description};
use validator::ValidationError;

use crate::dto::parse_rfc3339;

/// Largest password accepted, in UTF-8 bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Rejects strings made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates the password size limit measured in UTF-8 bytes, not characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        let mut err = ValidationError::new("password_empty");
        err.message = Some("password must not be empty".into());
        return Err(err);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        let mut err = ValidationError::new("password_too_long");
        err.message = Some(
            format!("password is too long (maximum {MAX_PASSWORD_BYTES} UTF-8 bytes)").into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Validates a calendar date written as `YYYY-MM-DD`.
///
/// # Examples
///
/// ```ignore
/// validate_birth_date("1990-02-28") // Ok
/// validate_birth_date("1990-02-30") // Err - no such day
/// validate_birth_date("28/02/1990") // Err - wrong format
/// ```
pub fn validate_birth_date(value: &str) -> Result<(), ValidationError> {
    let format = format_description!("[year]-[month]-[day]");
    if Date::parse(value.trim(), &format).is_err() {
        let mut err = ValidationError::new("birth_date_format");
        err.message = Some("birth date must be a valid YYYY-MM-DD date".into());
        return Err(err);
    }
    Ok(())
}

/// Validates an RFC 3339 date-time such as `2024-05-01T09:30:00Z`.
pub fn validate_rfc3339(value: &str) -> Result<(), ValidationError> {
    if parse_rfc3339(value).is_none() {
        let mut err = ValidationError::new("datetime_format");
        err.message = Some("expected an RFC 3339 date-time".into());
        return Err(err);
    }
    Ok(())
}

/// Validates a blood pressure reading written `SYS/DIA` with plausible values.
pub fn validate_blood_pressure(value: &str) -> Result<(), ValidationError> {
    let parsed = value
        .trim()
        .split_once('/')
        .and_then(|(sys, dia)| Some((sys.trim().parse::<u16>().ok()?, dia.trim().parse::<u16>().ok()?)));

    match parsed {
        Some((systolic, diastolic))
            if (50..=300).contains(&systolic)
                && (20..=200).contains(&diastolic)
                && diastolic < systolic =>
        {
            Ok(())
        }
        _ => {
            let mut err = ValidationError::new("blood_pressure_format");
            err.message =
                Some("blood pressure must look like `120/80` with diastolic below systolic".into());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_counts_bytes() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password(&"a".repeat(72)).is_ok());
        assert!(validate_password(&"a".repeat(73)).is_err());
        // 37 two-byte characters = 74 bytes
        assert!(validate_password(&"ñ".repeat(37)).is_err());
        assert!(validate_password("").is_err());
    }

    #[test]
    fn test_validate_birth_date() {
        assert!(validate_birth_date("1990-02-28").is_ok());
        assert!(validate_birth_date("2000-02-29").is_ok());
        assert!(validate_birth_date("1990-02-30").is_err());
        assert!(validate_birth_date("28/02/1990").is_err());
        assert!(validate_birth_date("").is_err());
    }

    #[test]
    fn test_validate_rfc3339() {
        assert!(validate_rfc3339("2024-05-01T09:30:00Z").is_ok());
        assert!(validate_rfc3339("2024-05-01T09:30:00-05:00").is_ok());
        assert!(validate_rfc3339("2024-05-01").is_err());
        assert!(validate_rfc3339("tomorrow").is_err());
    }

    #[test]
    fn test_validate_blood_pressure() {
        assert!(validate_blood_pressure("120/80").is_ok());
        assert!(validate_blood_pressure(" 135 / 85 ").is_ok());
        assert!(validate_blood_pressure("80/120").is_err()); // inverted
        assert!(validate_blood_pressure("120-80").is_err());
        assert!(validate_blood_pressure("abc/80").is_err());
        assert!(validate_blood_pressure("400/80").is_err());
    }

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("Ana").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }
}
