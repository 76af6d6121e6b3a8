use serde::Deserialize;
use validator::Validate;

use crate::domain::clinic::{ClinicSettings, NewClinic, WeekdaySet};
use crate::domain::types::{ClinicId, ClinicName, Money, clean_optional};
use crate::forms::{FormError, optional_email, optional_phone, parse_time};

#[derive(Deserialize, Validate)]
pub struct CreateClinicForm {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

impl TryFrom<CreateClinicForm> for NewClinic {
    type Error = FormError;

    fn try_from(form: CreateClinicForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(NewClinic::new(ClinicName::new(form.name)?))
    }
}

#[derive(Deserialize)]
pub struct SelectClinicForm {
    pub clinic_id: i32,
}

/// Clinic contact data and agenda configuration.
#[derive(Deserialize, Validate)]
pub struct SettingsForm {
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    /// `HH:MM`.
    pub opening_time: String,
    pub closing_time: String,
    #[validate(range(min = 5, max = 240))]
    pub slot_minutes: u32,
    /// ISO weekday numbers, Monday = 1.
    #[validate(length(min = 1, max = 7))]
    pub working_days: Vec<u32>,
    pub default_session_price: String,
}

impl SettingsForm {
    pub fn into_settings(self, clinic_id: ClinicId) -> Result<ClinicSettings, FormError> {
        self.validate()?;

        let settings = ClinicSettings {
            clinic_id,
            phone: optional_phone(self.phone)?,
            email: optional_email(self.email)?,
            address: clean_optional(self.address),
            opening_time: parse_time(&self.opening_time)?,
            closing_time: parse_time(&self.closing_time)?,
            slot_minutes: self.slot_minutes,
            working_days: WeekdaySet::new(self.working_days)?,
            default_session_price: self.default_session_price.parse::<Money>()?,
        };
        settings.validate()?;
        Ok(settings)
    }
}
