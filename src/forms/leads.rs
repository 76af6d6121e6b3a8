use serde::Deserialize;
use validator::Validate;

use crate::domain::lead::{LeadDetails, LeadStatus};
use crate::domain::types::{PersonName, clean_optional};
use crate::forms::{FormError, optional_email, optional_phone};

#[derive(Deserialize, Validate)]
pub struct LeadForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<LeadForm> for LeadDetails {
    type Error = FormError;

    fn try_from(form: LeadForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(LeadDetails {
            name: PersonName::new(form.name)?,
            phone: optional_phone(form.phone)?,
            email: optional_email(form.email)?,
            source: clean_optional(form.source),
            notes: clean_optional(form.notes),
        })
    }
}

#[derive(Deserialize)]
pub struct LeadStatusForm {
    pub status: LeadStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_requires_name() {
        let form = LeadForm {
            name: "".into(),
            phone: Some("11987654321".into()),
            email: None,
            source: None,
            notes: None,
        };
        assert!(matches!(
            LeadDetails::try_from(form),
            Err(FormError::Validation(_))
        ));
    }

    #[test]
    fn lead_phone_is_normalized() {
        let details = LeadDetails::try_from(LeadForm {
            name: "João".into(),
            phone: Some("(11) 98765-4321".into()),
            email: None,
            source: Some(" instagram ".into()),
            notes: None,
        })
        .unwrap();
        assert_eq!(details.phone.unwrap().as_str(), "+5511987654321");
        assert_eq!(details.source.as_deref(), Some("instagram"));
    }
}
