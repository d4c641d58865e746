use std::borrow::Cow;
use std::str::FromStr;

use validator::{ValidationError, ValidationErrors};

use crate::error::{Error, Result};

/// Blank or whitespace-only text counts as absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A single-field `VALIDATION_ERROR`.
pub fn field_error(field: &'static str, message: impl Into<String>) -> Error {
    let mut error = ValidationError::new("invalid");
    error.message = Some(Cow::Owned(message.into()));
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    Error::Validation(errors)
}

/// Parses an enum-valued request field.
pub fn parse_field<T>(field: &'static str, value: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|msg: String| field_error(field, msg))
}

pub fn require_text(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(field_error(field, format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationStatus;

    #[test]
    fn blank_notes_become_none() {
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" ok ".to_string())), Some("ok".to_string()));
    }

    #[test]
    fn unknown_enum_values_are_validation_errors() {
        let err = parse_field::<ApplicationStatus>("status", "hired").unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(parse_field::<ApplicationStatus>("status", "accepted").is_ok());
    }

    #[test]
    fn rejects_whitespace_text() {
        assert!(require_text("message", " \n").is_err());
        assert!(require_text("message", "please review").is_ok());
    }
}
