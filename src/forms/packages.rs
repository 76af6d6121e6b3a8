use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::domain::package::NewSessionPackage;
use crate::domain::types::{ClinicId, Description, Money, PatientId};
use crate::forms::FormError;

#[derive(Deserialize, Validate)]
pub struct PackageForm {
    pub patient_id: i32,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 1, max = 500))]
    pub total_sessions: u32,
    pub price: String,
    /// Defaults to today.
    pub purchased_at: Option<NaiveDate>,
    pub expires_at: Option<NaiveDate>,
    /// Also create the receivable for the package price.
    #[serde(default)]
    pub generate_receivable: bool,
}

pub struct PackagePayload {
    pub package: NewSessionPackage,
    pub generate_receivable: bool,
}

impl PackageForm {
    pub fn into_payload(
        self,
        clinic_id: ClinicId,
        today: NaiveDate,
    ) -> Result<PackagePayload, FormError> {
        self.validate()?;
        let package = NewSessionPackage::new(
            clinic_id,
            PatientId::new(self.patient_id)?,
            Description::new(self.name)?,
            self.total_sessions,
            self.price.parse::<Money>()?,
            self.purchased_at.unwrap_or(today),
            self.expires_at,
        )?;
        Ok(PackagePayload {
            package,
            generate_receivable: self.generate_receivable,
        })
    }
}
