use serde::Deserialize;
use validator::Validate;

use crate::domain::professional::{ProfessionalDetails, RoomDetails};
use crate::domain::types::{HexColor, PersonName, RoomName, clean_optional};
use crate::forms::{FormError, optional_email, optional_phone};

#[derive(Deserialize, Validate)]
pub struct ProfessionalForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub specialty: Option<String>,
    /// Council registration number.
    pub registration: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Agenda color, `#rrggbb`; a default is used when absent.
    pub color: Option<String>,
}

impl TryFrom<ProfessionalForm> for ProfessionalDetails {
    type Error = FormError;

    fn try_from(form: ProfessionalForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(ProfessionalDetails {
            name: PersonName::new(form.name)?,
            specialty: clean_optional(form.specialty),
            registration: clean_optional(form.registration),
            email: optional_email(form.email)?,
            phone: optional_phone(form.phone)?,
            color: clean_optional(form.color)
                .map(HexColor::new)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct RoomForm {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
}

impl TryFrom<RoomForm> for RoomDetails {
    type Error = FormError;

    fn try_from(form: RoomForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(RoomDetails {
            name: RoomName::new(form.name)?,
            description: clean_optional(form.description),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn professional_color_defaults() {
        let details = ProfessionalDetails::try_from(ProfessionalForm {
            name: "Dra. Carla".into(),
            specialty: Some("Ortopedia".into()),
            registration: Some(" CREFITO-3 12345-F ".into()),
            email: None,
            phone: None,
            color: None,
        })
        .unwrap();
        assert_eq!(details.color.as_str(), HexColor::DEFAULT);
        assert_eq!(details.registration.as_deref(), Some("CREFITO-3 12345-F"));
    }

    #[test]
    fn professional_color_must_be_hex() {
        let form = ProfessionalForm {
            name: "Dra. Carla".into(),
            specialty: None,
            registration: None,
            email: None,
            phone: None,
            color: Some("blue".into()),
        };
        assert!(ProfessionalDetails::try_from(form).is_err());
    }
}
