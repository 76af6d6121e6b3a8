use serde::Serialize;

use crate::domain::clinic::Clinic;
use crate::domain::member::{Member, Role};
use crate::domain::types::MemberId;

/// A clinic the caller belongs to, with the role held there.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ClinicMembership {
    #[serde(flatten)]
    pub clinic: Clinic,
    pub member_id: MemberId,
    pub role: Role,
}

impl ClinicMembership {
    pub fn new(clinic: Clinic, member: &Member) -> Self {
        Self {
            clinic,
            member_id: member.id,
            role: member.role,
        }
    }
}
