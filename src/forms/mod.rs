//! JSON payloads accepted by the API and their conversion into domain values.
//!
//! Each form derives [`validator::Validate`] for shape checks and converts
//! into a typed payload through `TryFrom`, so value-object rules (CPF, phone,
//! money) are enforced before a service sees the data.

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::{Email, PhoneNumber, TypeConstraintError, clean_optional};

pub mod appointments;
pub mod clinics;
pub mod finance;
pub mod leads;
pub mod medical;
pub mod members;
pub mod packages;
pub mod patients;
pub mod professionals;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Dados inválidos: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("E-mail inválido")]
    InvalidEmail,

    #[error("Telefone inválido")]
    InvalidPhone,

    #[error("CPF inválido")]
    InvalidCpf,

    #[error("Valor monetário inválido")]
    InvalidAmount,

    #[error("Horário inválido: {0}")]
    InvalidTime(String),

    #[error("Campo inválido: {0}")]
    InvalidField(String),

    #[error("Arquivo CSV inválido: {0}")]
    Csv(String),
}

impl From<TypeConstraintError> for FormError {
    fn from(err: TypeConstraintError) -> Self {
        match err {
            TypeConstraintError::InvalidEmail => FormError::InvalidEmail,
            TypeConstraintError::InvalidPhone => FormError::InvalidPhone,
            TypeConstraintError::InvalidCpf => FormError::InvalidCpf,
            TypeConstraintError::InvalidAmount => FormError::InvalidAmount,
            other => FormError::InvalidField(other.to_string()),
        }
    }
}

pub(crate) fn optional_email(value: Option<String>) -> Result<Option<Email>, FormError> {
    Ok(clean_optional(value).map(Email::new).transpose()?)
}

pub(crate) fn optional_phone(value: Option<String>) -> Result<Option<PhoneNumber>, FormError> {
    Ok(clean_optional(value).map(PhoneNumber::new).transpose()?)
}

/// Parses `HH:MM` or `HH:MM:SS`.
pub(crate) fn parse_time(value: &str) -> Result<chrono::NaiveTime, FormError> {
    let value = value.trim();
    chrono::NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| chrono::NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| FormError::InvalidTime(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optional_contacts_are_absent() {
        assert_eq!(optional_email(Some("  ".into())).unwrap(), None);
        assert_eq!(optional_phone(None).unwrap(), None);
        assert!(matches!(
            optional_email(Some("nope".into())),
            Err(FormError::InvalidEmail)
        ));
    }

    #[test]
    fn times_accept_minutes_and_seconds() {
        assert_eq!(parse_time("08:30").unwrap().to_string(), "08:30:00");
        assert_eq!(parse_time("18:00:00").unwrap().to_string(), "18:00:00");
        assert!(matches!(parse_time("25:00"), Err(FormError::InvalidTime(_))));
    }
}
