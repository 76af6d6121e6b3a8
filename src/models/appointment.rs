//! Diesel models for appointments and session packages.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::appointment::{
    Appointment as DomainAppointment, AppointmentDetails, NewAppointment as DomainNewAppointment,
};
use crate::domain::package::{
    NewSessionPackage as DomainNewSessionPackage, SessionPackage as DomainSessionPackage,
};
use crate::domain::types::{
    AppointmentId, ClinicId, Description, Money, PackageId, PatientId, ProfessionalId, RoomId,
    TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::appointments)]
/// Diesel model for [`crate::domain::appointment::Appointment`].
pub struct Appointment {
    pub id: i32,
    pub clinic_id: i32,
    pub patient_id: i32,
    pub professional_id: i32,
    pub room_id: Option<i32>,
    pub package_id: Option<i32>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub kind: String,
    pub status: String,
    pub notes: Option<String>,
    pub recurrence_group: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::appointments)]
pub struct NewAppointment<'a> {
    pub clinic_id: i32,
    pub patient_id: i32,
    pub professional_id: i32,
    pub room_id: Option<i32>,
    pub package_id: Option<i32>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub kind: &'a str,
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub recurrence_group: Option<&'a str>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::appointments)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateAppointment<'a> {
    pub patient_id: i32,
    pub professional_id: i32,
    pub room_id: Option<i32>,
    pub package_id: Option<i32>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub kind: &'a str,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::session_packages)]
pub struct SessionPackage {
    pub id: i32,
    pub clinic_id: i32,
    pub patient_id: i32,
    pub name: String,
    pub total_sessions: i32,
    pub used_sessions: i32,
    pub price: i64,
    pub purchased_at: NaiveDate,
    pub expires_at: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::session_packages)]
pub struct NewSessionPackage<'a> {
    pub clinic_id: i32,
    pub patient_id: i32,
    pub name: &'a str,
    pub total_sessions: i32,
    pub used_sessions: i32,
    pub price: i64,
    pub purchased_at: NaiveDate,
    pub expires_at: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

fn non_negative(value: i32, field: &str) -> Result<u32, TypeConstraintError> {
    u32::try_from(value).map_err(|_| TypeConstraintError::InvalidValue(format!("{field} {value}")))
}

impl TryFrom<Appointment> for DomainAppointment {
    type Error = TypeConstraintError;

    fn try_from(row: Appointment) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AppointmentId::try_from(row.id)?,
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            patient_id: PatientId::try_from(row.patient_id)?,
            professional_id: ProfessionalId::try_from(row.professional_id)?,
            room_id: row.room_id.map(RoomId::try_from).transpose()?,
            package_id: row.package_id.map(PackageId::try_from).transpose()?,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            kind: row.kind.parse()?,
            status: row.status.parse()?,
            notes: row.notes,
            recurrence_group: row.recurrence_group,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> NewAppointment<'a> {
    pub fn from_domain(appointment: &'a DomainNewAppointment, now: NaiveDateTime) -> Self {
        let d = &appointment.details;
        Self {
            clinic_id: appointment.clinic_id.get(),
            patient_id: d.patient_id.get(),
            professional_id: d.professional_id.get(),
            room_id: d.room_id.map(RoomId::get),
            package_id: d.package_id.map(PackageId::get),
            starts_at: d.starts_at,
            ends_at: d.ends_at,
            kind: d.kind.as_str(),
            status: appointment.status.as_str(),
            notes: d.notes.as_deref(),
            recurrence_group: appointment.recurrence_group.as_deref(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl<'a> UpdateAppointment<'a> {
    pub fn from_domain(d: &'a AppointmentDetails, now: NaiveDateTime) -> Self {
        Self {
            patient_id: d.patient_id.get(),
            professional_id: d.professional_id.get(),
            room_id: d.room_id.map(RoomId::get),
            package_id: d.package_id.map(PackageId::get),
            starts_at: d.starts_at,
            ends_at: d.ends_at,
            kind: d.kind.as_str(),
            notes: d.notes.as_deref(),
            updated_at: now,
        }
    }
}

impl TryFrom<SessionPackage> for DomainSessionPackage {
    type Error = TypeConstraintError;

    fn try_from(row: SessionPackage) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PackageId::try_from(row.id)?,
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            patient_id: PatientId::try_from(row.patient_id)?,
            name: Description::new(row.name)?,
            total_sessions: non_negative(row.total_sessions, "total sessions")?,
            used_sessions: non_negative(row.used_sessions, "used sessions")?,
            price: Money::from_cents(row.price)?,
            purchased_at: row.purchased_at,
            expires_at: row.expires_at,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

impl<'a> NewSessionPackage<'a> {
    pub fn from_domain(package: &'a DomainNewSessionPackage, now: NaiveDateTime) -> Self {
        Self {
            clinic_id: package.clinic_id.get(),
            patient_id: package.patient_id.get(),
            name: package.name.as_str(),
            total_sessions: package.total_sessions as i32,
            used_sessions: 0,
            price: package.price.cents(),
            purchased_at: package.purchased_at,
            expires_at: package.expires_at,
            is_active: true,
            created_at: now,
        }
    }
}
