use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ClinicId, Description, Money, PackageId, PatientId, TypeConstraintError};

string_enum!(PackageStatus {
    Active => "ativo",
    Exhausted => "esgotado",
    Expired => "expirado",
    Inactive => "inativo",
});

/// Prepaid bundle of appointment credits.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionPackage {
    pub id: PackageId,
    pub clinic_id: ClinicId,
    pub patient_id: PatientId,
    pub name: Description,
    pub total_sessions: u32,
    pub used_sessions: u32,
    pub price: Money,
    pub purchased_at: NaiveDate,
    pub expires_at: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

impl SessionPackage {
    pub fn remaining_sessions(&self) -> u32 {
        self.total_sessions.saturating_sub(self.used_sessions)
    }

    pub fn status(&self, today: NaiveDate) -> PackageStatus {
        if !self.is_active {
            PackageStatus::Inactive
        } else if self.used_sessions >= self.total_sessions {
            PackageStatus::Exhausted
        } else if self.expires_at.is_some_and(|expires| expires < today) {
            PackageStatus::Expired
        } else {
            PackageStatus::Active
        }
    }

    /// A credit can be consumed only from an active package.
    pub fn can_consume(&self, today: NaiveDate) -> bool {
        self.status(today) == PackageStatus::Active
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewSessionPackage {
    pub clinic_id: ClinicId,
    pub patient_id: PatientId,
    pub name: Description,
    pub total_sessions: u32,
    pub price: Money,
    pub purchased_at: NaiveDate,
    pub expires_at: Option<NaiveDate>,
}

impl NewSessionPackage {
    pub fn new(
        clinic_id: ClinicId,
        patient_id: PatientId,
        name: Description,
        total_sessions: u32,
        price: Money,
        purchased_at: NaiveDate,
        expires_at: Option<NaiveDate>,
    ) -> Result<Self, TypeConstraintError> {
        if total_sessions == 0 {
            return Err(TypeConstraintError::InvalidValue(
                "a package needs at least one session".to_string(),
            ));
        }
        if expires_at.is_some_and(|expires| expires < purchased_at) {
            return Err(TypeConstraintError::InvalidValue(
                "package expires before purchase".to_string(),
            ));
        }
        Ok(Self {
            clinic_id,
            patient_id,
            name,
            total_sessions,
            price,
            purchased_at,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn package(used: u32, expires_at: Option<NaiveDate>) -> SessionPackage {
        SessionPackage {
            id: PackageId::new(1).unwrap(),
            clinic_id: ClinicId::new(1).unwrap(),
            patient_id: PatientId::new(1).unwrap(),
            name: Description::new("Pacote 10 sessões").unwrap(),
            total_sessions: 10,
            used_sessions: used,
            price: Money::from_cents(100_000).unwrap(),
            purchased_at: date(1, 10),
            expires_at,
            is_active: true,
            created_at: date(1, 10).and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn status_reflects_credits_and_expiry() {
        assert_eq!(package(3, None).status(date(2, 1)), PackageStatus::Active);
        assert_eq!(package(10, None).status(date(2, 1)), PackageStatus::Exhausted);
        assert_eq!(
            package(3, Some(date(1, 31))).status(date(2, 1)),
            PackageStatus::Expired
        );
        assert_eq!(
            package(3, Some(date(2, 1))).status(date(2, 1)),
            PackageStatus::Active
        );

        let mut inactive = package(0, None);
        inactive.is_active = false;
        assert!(!inactive.can_consume(date(2, 1)));
    }

    #[test]
    fn remaining_never_underflows() {
        assert_eq!(package(4, None).remaining_sessions(), 6);
        assert_eq!(package(12, None).remaining_sessions(), 0);
    }

    #[test]
    fn new_package_requires_sessions_and_consistent_dates() {
        let clinic = ClinicId::new(1).unwrap();
        let patient = PatientId::new(2).unwrap();
        let name = Description::new("Pacote").unwrap();
        assert!(NewSessionPackage::new(clinic, patient, name.clone(), 0, Money::ZERO, date(1, 1), None).is_err());
        assert!(
            NewSessionPackage::new(clinic, patient, name.clone(), 5, Money::ZERO, date(2, 1), Some(date(1, 1)))
                .is_err()
        );
        assert!(NewSessionPackage::new(clinic, patient, name, 5, Money::ZERO, date(1, 1), None).is_ok());
    }
}
