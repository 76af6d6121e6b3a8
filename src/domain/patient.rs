use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ClinicId, Cpf, Email, PatientId, PersonName, PhoneNumber};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: PatientId,
    pub clinic_id: ClinicId,
    pub name: PersonName,
    pub cpf: Option<Cpf>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<PhoneNumber>,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub health_insurance: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Patient {
    /// Age in whole years on the given date.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        let mut years = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }
}

/// Editable patient attributes shared by creation and update.
#[derive(Clone, Debug, PartialEq)]
pub struct PatientDetails {
    pub name: PersonName,
    pub cpf: Option<Cpf>,
    pub birth_date: Option<NaiveDate>,
    pub phone: Option<PhoneNumber>,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub health_insurance: Option<String>,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
}

impl PatientDetails {
    #[must_use]
    pub fn named(name: PersonName) -> Self {
        Self {
            name,
            cpf: None,
            birth_date: None,
            phone: None,
            email: None,
            address: None,
            health_insurance: None,
            emergency_contact: None,
            notes: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewPatient {
    pub clinic_id: ClinicId,
    pub details: PatientDetails,
}

impl NewPatient {
    #[must_use]
    pub fn new(clinic_id: ClinicId, details: PatientDetails) -> Self {
        Self { clinic_id, details }
    }
}

/// Search and paging options for patient listings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PatientListQuery {
    pub search: Option<String>,
    pub include_inactive: bool,
    pub page: usize,
    pub per_page: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient(birth_date: Option<NaiveDate>) -> Patient {
        let now = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Patient {
            id: PatientId::new(1).unwrap(),
            clinic_id: ClinicId::new(1).unwrap(),
            name: PersonName::new("Maria").unwrap(),
            cpf: None,
            birth_date,
            phone: None,
            email: None,
            address: None,
            health_insurance: None,
            emergency_contact: None,
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn age_counts_completed_birthdays() {
        let p = patient(NaiveDate::from_ymd_opt(1990, 6, 15));
        assert_eq!(p.age_on(NaiveDate::from_ymd_opt(2026, 6, 14).unwrap()), Some(35));
        assert_eq!(p.age_on(NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()), Some(36));
    }

    #[test]
    fn age_is_absent_without_birth_date() {
        assert_eq!(patient(None).age_on(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()), None);
    }
}
