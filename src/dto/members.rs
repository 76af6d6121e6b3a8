use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::invitation::{Invitation, InvitationStatus};
use crate::domain::member::Role;
use crate::domain::types::{Email, InvitationId, MemberId};

/// Invitation as listed to administrators: the token is withheld and the
/// status accounts for expiry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvitationView {
    pub id: InvitationId,
    pub email: Email,
    pub role: Role,
    pub status: InvitationStatus,
    pub invited_by: Option<MemberId>,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub accepted_at: Option<NaiveDateTime>,
}

impl InvitationView {
    pub fn new(invitation: Invitation, now: NaiveDateTime) -> Self {
        Self {
            status: invitation.effective_status(now),
            id: invitation.id,
            email: invitation.email,
            role: invitation.role,
            invited_by: invitation.invited_by,
            expires_at: invitation.expires_at,
            created_at: invitation.created_at,
            accepted_at: invitation.accepted_at,
        }
    }
}
