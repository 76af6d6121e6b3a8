use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    ClinicId, Email, HexColor, PersonName, PhoneNumber, ProfessionalId, RoomId, RoomName,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Professional {
    pub id: ProfessionalId,
    pub clinic_id: ClinicId,
    pub name: PersonName,
    pub specialty: Option<String>,
    /// Council registration (CREFITO).
    pub registration: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<PhoneNumber>,
    pub color: HexColor,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProfessionalDetails {
    pub name: PersonName,
    pub specialty: Option<String>,
    pub registration: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<PhoneNumber>,
    pub color: HexColor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewProfessional {
    pub clinic_id: ClinicId,
    pub details: ProfessionalDetails,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub clinic_id: ClinicId,
    pub name: RoomName,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoomDetails {
    pub name: RoomName,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewRoom {
    pub clinic_id: ClinicId,
    pub details: RoomDetails,
}
