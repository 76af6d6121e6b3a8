//! Invitations that let a clinic admin bring new users into the clinic.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::member::Role;
use crate::domain::types::{ClinicId, Email, InvitationId, MemberId, TypeConstraintError};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvitationStatus {
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "aceito")]
    Accepted,
    #[serde(rename = "revogado")]
    Revoked,
    /// Never stored: a pending invitation past its expiry date reads as expired.
    #[serde(rename = "expirado")]
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pendente",
            InvitationStatus::Accepted => "aceito",
            InvitationStatus::Revoked => "revogado",
            InvitationStatus::Expired => "expirado",
        }
    }
}

impl Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InvitationStatus {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendente" => Ok(InvitationStatus::Pending),
            "aceito" => Ok(InvitationStatus::Accepted),
            "revogado" => Ok(InvitationStatus::Revoked),
            "expirado" => Ok(InvitationStatus::Expired),
            other => Err(TypeConstraintError::InvalidValue(format!(
                "invitation status {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Invitation {
    pub id: InvitationId,
    pub clinic_id: ClinicId,
    pub email: Email,
    pub role: Role,
    pub token: String,
    pub status: InvitationStatus,
    pub invited_by: Option<MemberId>,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub accepted_at: Option<NaiveDateTime>,
}

impl Invitation {
    /// Status as seen at `now`, turning stale pending invitations into expired ones.
    pub fn effective_status(&self, now: NaiveDateTime) -> InvitationStatus {
        match self.status {
            InvitationStatus::Pending if now >= self.expires_at => InvitationStatus::Expired,
            status => status,
        }
    }

    pub fn is_acceptable(&self, now: NaiveDateTime) -> bool {
        self.effective_status(now) == InvitationStatus::Pending
    }
}

#[derive(Clone, Debug)]
pub struct NewInvitation {
    pub clinic_id: ClinicId,
    pub email: Email,
    pub role: Role,
    pub token: String,
    pub invited_by: Option<MemberId>,
    pub expires_at: NaiveDateTime,
}

impl NewInvitation {
    /// Creates a pending invitation with a fresh random token.
    #[must_use]
    pub fn new(
        clinic_id: ClinicId,
        email: Email,
        role: Role,
        invited_by: Option<MemberId>,
        expires_at: NaiveDateTime,
    ) -> Self {
        Self {
            clinic_id,
            email,
            role,
            token: Uuid::new_v4().simple().to_string(),
            invited_by,
            expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;

    fn sample(status: InvitationStatus, expires_at: NaiveDateTime) -> Invitation {
        Invitation {
            id: InvitationId::new(1).unwrap(),
            clinic_id: ClinicId::new(1).unwrap(),
            email: Email::new("nova@clinica.com").unwrap(),
            role: Role::Receptionist,
            token: "abc".to_string(),
            status,
            invited_by: None,
            expires_at,
            created_at: expires_at - Duration::days(7),
            accepted_at: None,
        }
    }

    fn noon(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn pending_invitation_expires_after_deadline() {
        let invitation = sample(InvitationStatus::Pending, noon(10));
        assert_eq!(invitation.effective_status(noon(9)), InvitationStatus::Pending);
        assert!(invitation.is_acceptable(noon(9)));
        assert_eq!(invitation.effective_status(noon(10)), InvitationStatus::Expired);
        assert!(!invitation.is_acceptable(noon(11)));
    }

    #[test]
    fn accepted_and_revoked_never_become_expired() {
        let accepted = sample(InvitationStatus::Accepted, noon(10));
        assert_eq!(accepted.effective_status(noon(20)), InvitationStatus::Accepted);
        let revoked = sample(InvitationStatus::Revoked, noon(10));
        assert_eq!(revoked.effective_status(noon(20)), InvitationStatus::Revoked);
    }

    #[test]
    fn new_invitations_get_distinct_tokens() {
        let email = Email::new("a@b.com").unwrap();
        let clinic_id = ClinicId::new(1).unwrap();
        let a = NewInvitation::new(clinic_id, email.clone(), Role::Admin, None, noon(1));
        let b = NewInvitation::new(clinic_id, email, Role::Admin, None, noon(1));
        assert_ne!(a.token, b.token);
        assert_eq!(a.token.len(), 32);
    }
}
