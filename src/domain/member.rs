//! Clinic members (users of a tenant) and their roles.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{ClinicId, Email, MemberId, PersonName, TypeConstraintError};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "fisioterapeuta")]
    Physiotherapist,
    #[serde(rename = "recepcionista")]
    Receptionist,
    #[serde(rename = "financeiro")]
    Financial,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Admin,
        Role::Physiotherapist,
        Role::Receptionist,
        Role::Financial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Physiotherapist => "fisioterapeuta",
            Role::Receptionist => "recepcionista",
            Role::Financial => "financeiro",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Role::Admin),
            "fisioterapeuta" => Ok(Role::Physiotherapist),
            "recepcionista" => Ok(Role::Receptionist),
            "financeiro" => Ok(Role::Financial),
            other => Err(TypeConstraintError::InvalidValue(format!("role {other}"))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub id: MemberId,
    pub clinic_id: ClinicId,
    pub email: Email,
    pub name: PersonName,
    pub role: Role,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewMember {
    pub clinic_id: ClinicId,
    pub email: Email,
    pub name: PersonName,
    pub role: Role,
}

impl NewMember {
    #[must_use]
    pub fn new(clinic_id: ClinicId, email: Email, name: PersonName, role: Role) -> Self {
        Self {
            clinic_id,
            email,
            name,
            role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_storage_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
        assert!("owner".parse::<Role>().is_err());
    }
}
