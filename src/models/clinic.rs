//! Diesel models for clinics and their settings.

use chrono::{NaiveDateTime, NaiveTime};
use diesel::prelude::*;

use crate::domain::clinic::{
    Clinic as DomainClinic, ClinicSettings as DomainClinicSettings, NewClinic as DomainNewClinic,
};
use crate::domain::types::{ClinicId, ClinicName, Email, Money, PhoneNumber, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::clinics)]
/// Diesel model for [`crate::domain::clinic::Clinic`].
pub struct Clinic {
    pub id: i32,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::clinics)]
pub struct NewClinic<'a> {
    pub name: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::clinic_settings)]
#[diesel(primary_key(clinic_id))]
#[diesel(treat_none_as_null = true)]
/// Settings row, used for reads, the initial insert and full updates.
pub struct ClinicSettings {
    pub clinic_id: i32,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub slot_minutes: i32,
    pub working_days: String,
    pub default_session_price: i64,
}

impl TryFrom<Clinic> for DomainClinic {
    type Error = TypeConstraintError;

    fn try_from(clinic: Clinic) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ClinicId::try_from(clinic.id)?,
            name: ClinicName::new(clinic.name)?,
            created_at: clinic.created_at,
        })
    }
}

impl<'a> NewClinic<'a> {
    pub fn from_domain(clinic: &'a DomainNewClinic, created_at: NaiveDateTime) -> Self {
        Self {
            name: clinic.name.as_str(),
            created_at,
        }
    }
}

impl TryFrom<ClinicSettings> for DomainClinicSettings {
    type Error = TypeConstraintError;

    fn try_from(row: ClinicSettings) -> Result<Self, Self::Error> {
        Ok(Self {
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            phone: row.phone.map(PhoneNumber::new).transpose()?,
            email: row.email.map(Email::new).transpose()?,
            address: row.address,
            opening_time: row.opening_time,
            closing_time: row.closing_time,
            slot_minutes: u32::try_from(row.slot_minutes)
                .map_err(|_| TypeConstraintError::InvalidValue("slot minutes".to_string()))?,
            working_days: row.working_days.parse()?,
            default_session_price: Money::from_cents(row.default_session_price)?,
        })
    }
}

impl From<&DomainClinicSettings> for ClinicSettings {
    fn from(settings: &DomainClinicSettings) -> Self {
        Self {
            clinic_id: settings.clinic_id.get(),
            phone: settings.phone.as_ref().map(|p| p.as_str().to_string()),
            email: settings.email.as_ref().map(|e| e.as_str().to_string()),
            address: settings.address.clone(),
            opening_time: settings.opening_time,
            closing_time: settings.closing_time,
            slot_minutes: settings.slot_minutes as i32,
            working_days: settings.working_days.to_db_string(),
            default_session_price: settings.default_session_price.cents(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_round_trip_between_row_and_domain() {
        let domain = DomainClinicSettings::defaults(ClinicId::new(4).unwrap());
        let row = ClinicSettings::from(&domain);
        assert_eq!(row.working_days, "1,2,3,4,5");
        assert_eq!(row.slot_minutes, 60);

        let back = DomainClinicSettings::try_from(row).expect("valid settings row");
        assert_eq!(back, domain);
    }

    #[test]
    fn clinic_row_rejects_blank_name() {
        let row = Clinic {
            id: 1,
            name: "  ".into(),
            created_at: chrono::Local::now().naive_local(),
        };
        assert!(DomainClinic::try_from(row).is_err());
    }
}
