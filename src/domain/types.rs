//! Strongly-typed value objects used by domain entities.
//!
//! These wrappers enforce basic invariants (e.g., positive identifiers,
//! normalized/validated email, checked CPF digits, non-negative money) so that
//! once a value reaches the domain layer it can be treated as trusted.
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;

use phonenumber::{Mode, country, parse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidateEmail;

/// Errors produced when attempting to construct a constrained value object.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Provided identifier is zero or negative.
    #[error("id must be greater than zero")]
    NonPositiveId,
    /// Provided email failed format validation.
    #[error("invalid email address")]
    InvalidEmail,
    /// Provided string contained no non-whitespace characters.
    #[error("value cannot be empty")]
    EmptyString,
    /// Provided value failed custom validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Phone number did not meet expected format.
    #[error("invalid phone number")]
    InvalidPhone,
    /// CPF length or check digits are wrong.
    #[error("invalid CPF")]
    InvalidCpf,
    /// Monetary amount could not be parsed or was negative.
    #[error("invalid amount")]
    InvalidAmount,
}

/// Normalizes and validates an email string.
fn normalize_email<S: Into<String>>(email: S) -> Result<String, TypeConstraintError> {
    let normalized = email.into().trim().to_lowercase();
    if normalized.validate_email() {
        Ok(normalized)
    } else {
        Err(TypeConstraintError::InvalidEmail)
    }
}

/// Macro to generate lightweight newtypes for positive identifiers.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[serde(try_from = "i32")]
        pub struct $name(i32);

        impl $name {
            /// Creates a new identifier ensuring it is greater than zero.
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            /// Returns the raw `i32` backing this identifier.
            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(ClinicId, "Unique identifier for a clinic (tenant).");
id_newtype!(MemberId, "Unique identifier for a clinic member.");
id_newtype!(InvitationId, "Unique identifier for a user invitation.");
id_newtype!(PatientId, "Unique identifier for a patient.");
id_newtype!(ProfessionalId, "Unique identifier for a professional.");
id_newtype!(RoomId, "Unique identifier for a room.");
id_newtype!(AppointmentId, "Unique identifier for an appointment.");
id_newtype!(PackageId, "Unique identifier for a session package.");
id_newtype!(MedicalRecordId, "Unique identifier for a medical record.");
id_newtype!(EvolutionId, "Unique identifier for an evolution note.");
id_newtype!(PayableId, "Unique identifier for an account payable.");
id_newtype!(ReceivableId, "Unique identifier for an account receivable.");
id_newtype!(LeadId, "Unique identifier for a lead.");

/// Lower-cased and validated email address.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub struct Email(String);

impl Email {
    /// Validates and normalizes an email string.
    pub fn new<S: Into<String>>(email: S) -> Result<Self, TypeConstraintError> {
        let normalized = normalize_email(email)?;
        Ok(Self(normalized))
    }

    /// Borrow the email as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the owned inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Email {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Wrapper for non-empty, trimmed strings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Trims whitespace and rejects empty inputs.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        Ok(Self(trimmed))
    }

    /// Borrow the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[serde(try_from = "String")]
        pub struct $name(String);

        impl $name {
            /// Constructs a trimmed, non-empty value.
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let inner = NonEmptyString::new(value)?;
                Ok(Self(inner.into_inner()))
            }

            /// Borrow the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the owned string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

non_empty_string_newtype!(ClinicName, "Clinic name wrapper enforcing non-empty values.");

non_empty_string_newtype!(
    PersonName,
    "Name of a patient, professional, member or lead enforcing non-empty values."
);

non_empty_string_newtype!(RoomName, "Room name wrapper enforcing non-empty values.");

non_empty_string_newtype!(
    Description,
    "Short label of a financial entry or package enforcing non-empty values."
);

/// Clinical free text, sanitized and non-empty.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub struct ClinicalText(String);

impl ClinicalText {
    /// Constructs a sanitized, trimmed, non-empty value.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let sanitized = ammonia::clean(&value.into());
        let inner = NonEmptyString::new(sanitized)?;
        Ok(Self(inner.into_inner()))
    }

    /// Wraps text read back from storage, which was sanitized on the way in.
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// Borrow the value as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for ClinicalText {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Display for ClinicalText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalizes a phone number string to E.164 format.
///
/// Numbers written without an international prefix are read as Brazilian.
pub fn normalize_phone_to_e164(value: &str) -> Result<String, TypeConstraintError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TypeConstraintError::EmptyString);
    }
    let parsed =
        parse(Some(country::Id::BR), trimmed).map_err(|_| TypeConstraintError::InvalidPhone)?;
    Ok(parsed.format().mode(Mode::E164).to_string())
}

/// Normalized phone number wrapper (expected E.164).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Constructs a phone number ensuring it is valid and normalizes to E.164 format.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let normalized = normalize_phone_to_e164(&value.into())?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for PhoneNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for PhoneNumber {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

/// Brazilian taxpayer number stored as its 11 digits.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub struct Cpf(String);

impl Cpf {
    /// Strips punctuation and verifies both check digits.
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let raw = value.into();
        let digits: Vec<u32> = raw
            .chars()
            .filter(|c| !matches!(c, '.' | '-' | ' '))
            .map(|c| c.to_digit(10).ok_or(TypeConstraintError::InvalidCpf))
            .collect::<Result<_, _>>()?;

        if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
            return Err(TypeConstraintError::InvalidCpf);
        }

        let check = |len: usize| -> u32 {
            let weight_start = len as u32 + 1;
            let sum: u32 = digits[..len]
                .iter()
                .enumerate()
                .map(|(i, d)| d * (weight_start - i as u32))
                .sum();
            match (sum * 10) % 11 {
                10 => 0,
                r => r,
            }
        };

        if check(9) != digits[9] || check(10) != digits[10] {
            return Err(TypeConstraintError::InvalidCpf);
        }

        Ok(Self(digits.iter().map(|d| char::from(b'0' + *d as u8)).collect()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Formats as `000.000.000-00`.
    pub fn formatted(&self) -> String {
        let s = &self.0;
        format!("{}.{}.{}-{}", &s[0..3], &s[3..6], &s[6..9], &s[9..11])
    }
}

impl Display for Cpf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl TryFrom<String> for Cpf {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Cpf> for String {
    fn from(value: Cpf) -> Self {
        value.0
    }
}

/// Non-negative amount of money in cents.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i64")]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Wraps an amount of cents, rejecting negative values.
    pub fn from_cents(cents: i64) -> Result<Self, TypeConstraintError> {
        if cents < 0 {
            Err(TypeConstraintError::InvalidAmount)
        } else {
            Ok(Self(cents))
        }
    }

    pub const fn cents(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Money {
    type Error = TypeConstraintError;

    fn try_from(cents: i64) -> Result<Self, Self::Error> {
        Self::from_cents(cents)
    }
}

impl FromStr for Money {
    type Err = TypeConstraintError;

    /// Accepts `150`, `150.5`, `150,50` and `1.234,56` (optionally prefixed by `R$`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .trim()
            .trim_start_matches("R$")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return Err(TypeConstraintError::InvalidAmount);
        }

        let normalized = if cleaned.contains(',') {
            cleaned.replace('.', "").replace(',', ".")
        } else {
            cleaned
        };

        let (units, fraction) = match normalized.split_once('.') {
            Some((units, fraction)) => (units, fraction),
            None => (normalized.as_str(), ""),
        };
        if fraction.len() > 2
            || !units.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
            || units.is_empty()
        {
            return Err(TypeConstraintError::InvalidAmount);
        }

        let units: i64 = units
            .parse()
            .map_err(|_| TypeConstraintError::InvalidAmount)?;
        let fraction: i64 = format!("{fraction:0<2}")
            .parse()
            .map_err(|_| TypeConstraintError::InvalidAmount)?;

        units
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .ok_or(TypeConstraintError::InvalidAmount)
            .and_then(Self::from_cents)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, value| acc + value)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Pain intensity on the 0..=10 visual analogue scale.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "i32")]
pub struct PainLevel(u8);

impl PainLevel {
    pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
        if (0..=10).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(TypeConstraintError::InvalidValue(format!(
                "pain level {value} outside 0..=10"
            )))
        }
    }

    pub const fn get(self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i32> for PainLevel {
    type Error = TypeConstraintError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Agenda color in `#rrggbb` form, lower-cased.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub struct HexColor(String);

impl HexColor {
    pub const DEFAULT: &'static str = "#3b82f6";

    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let value = value.into().trim().to_lowercase();
        let valid = value.len() == 7
            && value.starts_with('#')
            && value[1..].chars().all(|c| c.is_ascii_hexdigit());
        if valid {
            Ok(Self(value))
        } else {
            Err(TypeConstraintError::InvalidValue(format!("color {value}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for HexColor {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Default for HexColor {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

/// Trims an optional free-text value, treating blank input as absent.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_reject_non_positive_values() {
        assert_eq!(PatientId::new(0), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(ClinicId::new(-3), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(AppointmentId::new(7).map(AppointmentId::get), Ok(7));
    }

    #[test]
    fn email_is_lowercased_and_trimmed() {
        let email = Email::new("  Ana.Souza@Clinica.COM ").expect("valid email");
        assert_eq!(email.as_str(), "ana.souza@clinica.com");
        assert_eq!(Email::new("not-an-email"), Err(TypeConstraintError::InvalidEmail));
    }

    #[test]
    fn names_must_not_be_blank() {
        assert_eq!(PersonName::new("   "), Err(TypeConstraintError::EmptyString));
        assert_eq!(PersonName::new(" Maria ").unwrap().as_str(), "Maria");
    }

    #[test]
    fn cpf_accepts_valid_numbers_with_punctuation() {
        let cpf = Cpf::new("529.982.247-25").expect("valid cpf");
        assert_eq!(cpf.as_str(), "52998224725");
        assert_eq!(cpf.formatted(), "529.982.247-25");
        assert!(Cpf::new("11144477735").is_ok());
    }

    #[test]
    fn cpf_rejects_bad_check_digits_and_repeated_sequences() {
        assert_eq!(Cpf::new("529.982.247-26"), Err(TypeConstraintError::InvalidCpf));
        assert_eq!(Cpf::new("111.111.111-11"), Err(TypeConstraintError::InvalidCpf));
        assert_eq!(Cpf::new("1234"), Err(TypeConstraintError::InvalidCpf));
        assert_eq!(Cpf::new("5299822472a"), Err(TypeConstraintError::InvalidCpf));
    }

    #[test]
    fn money_parses_brazilian_and_plain_notation() {
        assert_eq!("150".parse::<Money>().unwrap().cents(), 15_000);
        assert_eq!("150.5".parse::<Money>().unwrap().cents(), 15_050);
        assert_eq!("150,50".parse::<Money>().unwrap().cents(), 15_050);
        assert_eq!("R$ 1.234,56".parse::<Money>().unwrap().cents(), 123_456);
        assert_eq!(Money::from_cents(123_456).unwrap().to_string(), "1234.56");
    }

    #[test]
    fn money_rejects_garbage_and_negatives() {
        assert!("".parse::<Money>().is_err());
        assert!("-10".parse::<Money>().is_err());
        assert!("10.999".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert_eq!(Money::from_cents(-1), Err(TypeConstraintError::InvalidAmount));
    }

    #[test]
    fn deserializing_validates_values() {
        assert_eq!(
            serde_json::from_str::<Money>("15050").unwrap().cents(),
            15_050
        );
        assert!(serde_json::from_str::<Money>("-1").is_err());
        assert!(serde_json::from_str::<PainLevel>("11").is_err());
        assert!(serde_json::from_str::<PatientId>("0").is_err());
        assert!(serde_json::from_str::<HexColor>(r#""blue""#).is_err());
        assert!(serde_json::from_str::<Email>(r#""not-an-email""#).is_err());
    }

    #[test]
    fn phone_is_normalized_to_e164() {
        let phone = PhoneNumber::new("+55 11 98765-4321").expect("valid phone");
        assert_eq!(phone.as_str(), "+5511987654321");
        let national = PhoneNumber::new("(11) 98765-4321").expect("valid national phone");
        assert_eq!(national.as_str(), "+5511987654321");
    }

    #[test]
    fn pain_level_is_bounded() {
        assert!(PainLevel::new(0).is_ok());
        assert!(PainLevel::new(10).is_ok());
        assert!(PainLevel::new(11).is_err());
        assert!(PainLevel::new(-1).is_err());
    }

    #[test]
    fn hex_color_validation() {
        assert_eq!(HexColor::new("#A1B2C3").unwrap().as_str(), "#a1b2c3");
        assert!(HexColor::new("blue").is_err());
        assert!(HexColor::new("#12345").is_err());
    }

    #[test]
    fn clinical_text_is_sanitized() {
        let text = ClinicalText::new("Dor lombar <script>alert(1)</script>").unwrap();
        assert_eq!(text.as_str(), "Dor lombar");
        assert!(ClinicalText::new("<script></script>").is_err());
    }
}
