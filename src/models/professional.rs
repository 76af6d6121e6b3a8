//! Diesel models for professionals and rooms.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::professional::{
    NewProfessional as DomainNewProfessional, NewRoom as DomainNewRoom,
    Professional as DomainProfessional, ProfessionalDetails, Room as DomainRoom, RoomDetails,
};
use crate::domain::types::{
    ClinicId, Email, HexColor, PersonName, PhoneNumber, ProfessionalId, RoomId, RoomName,
    TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::professionals)]
pub struct Professional {
    pub id: i32,
    pub clinic_id: i32,
    pub name: String,
    pub specialty: Option<String>,
    pub registration: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub color: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::professionals)]
pub struct NewProfessional<'a> {
    pub clinic_id: i32,
    pub name: &'a str,
    pub specialty: Option<&'a str>,
    pub registration: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub color: &'a str,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::professionals)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateProfessional<'a> {
    pub name: &'a str,
    pub specialty: Option<&'a str>,
    pub registration: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub color: &'a str,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::rooms)]
pub struct Room {
    pub id: i32,
    pub clinic_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::rooms)]
pub struct NewRoom<'a> {
    pub clinic_id: i32,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::rooms)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateRoom<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
}

impl TryFrom<Professional> for DomainProfessional {
    type Error = TypeConstraintError;

    fn try_from(row: Professional) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProfessionalId::try_from(row.id)?,
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            name: PersonName::new(row.name)?,
            specialty: row.specialty,
            registration: row.registration,
            email: row.email.map(Email::new).transpose()?,
            phone: row.phone.map(PhoneNumber::new).transpose()?,
            color: HexColor::new(row.color)?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

impl<'a> NewProfessional<'a> {
    pub fn from_domain(professional: &'a DomainNewProfessional, now: NaiveDateTime) -> Self {
        let d = &professional.details;
        Self {
            clinic_id: professional.clinic_id.get(),
            name: d.name.as_str(),
            specialty: d.specialty.as_deref(),
            registration: d.registration.as_deref(),
            email: d.email.as_ref().map(Email::as_str),
            phone: d.phone.as_ref().map(PhoneNumber::as_str),
            color: d.color.as_str(),
            is_active: true,
            created_at: now,
        }
    }
}

impl<'a> From<&'a ProfessionalDetails> for UpdateProfessional<'a> {
    fn from(d: &'a ProfessionalDetails) -> Self {
        Self {
            name: d.name.as_str(),
            specialty: d.specialty.as_deref(),
            registration: d.registration.as_deref(),
            email: d.email.as_ref().map(Email::as_str),
            phone: d.phone.as_ref().map(PhoneNumber::as_str),
            color: d.color.as_str(),
        }
    }
}

impl TryFrom<Room> for DomainRoom {
    type Error = TypeConstraintError;

    fn try_from(row: Room) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RoomId::try_from(row.id)?,
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            name: RoomName::new(row.name)?,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

impl<'a> NewRoom<'a> {
    pub fn from_domain(room: &'a DomainNewRoom, now: NaiveDateTime) -> Self {
        Self {
            clinic_id: room.clinic_id.get(),
            name: room.details.name.as_str(),
            description: room.details.description.as_deref(),
            is_active: true,
            created_at: now,
        }
    }
}

impl<'a> From<&'a RoomDetails> for UpdateRoom<'a> {
    fn from(d: &'a RoomDetails) -> Self {
        Self {
            name: d.name.as_str(),
            description: d.description.as_deref(),
        }
    }
}
