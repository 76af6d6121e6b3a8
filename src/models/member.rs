//! Diesel models for members, invitations and permission overrides.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::invitation::{
    Invitation as DomainInvitation, InvitationStatus, NewInvitation as DomainNewInvitation,
};
use crate::domain::member::{Member as DomainMember, NewMember as DomainNewMember};
use crate::domain::permission::{Permission as DomainPermission, PermissionFlags};
use crate::domain::types::{
    ClinicId, Email, InvitationId, MemberId, PersonName, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::members)]
/// Diesel model for [`crate::domain::member::Member`].
pub struct Member {
    pub id: i32,
    pub clinic_id: i32,
    pub email: String,
    pub name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::members)]
pub struct NewMember<'a> {
    pub clinic_id: i32,
    pub email: &'a str,
    pub name: &'a str,
    pub role: &'a str,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::invitations)]
pub struct Invitation {
    pub id: i32,
    pub clinic_id: i32,
    pub email: String,
    pub role: String,
    pub token: String,
    pub status: String,
    pub invited_by: Option<i32>,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub accepted_at: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::invitations)]
pub struct NewInvitation<'a> {
    pub clinic_id: i32,
    pub email: &'a str,
    pub role: &'a str,
    pub token: &'a str,
    pub status: &'a str,
    pub invited_by: Option<i32>,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::permissions)]
#[diesel(primary_key(clinic_id, role, module))]
/// Stored override of the default permission flags.
pub struct Permission {
    pub clinic_id: i32,
    pub role: String,
    pub module: String,
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl TryFrom<Member> for DomainMember {
    type Error = TypeConstraintError;

    fn try_from(member: Member) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MemberId::try_from(member.id)?,
            clinic_id: ClinicId::try_from(member.clinic_id)?,
            email: Email::new(member.email)?,
            name: PersonName::new(member.name)?,
            role: member.role.parse()?,
            is_active: member.is_active,
            created_at: member.created_at,
        })
    }
}

impl<'a> NewMember<'a> {
    pub fn from_domain(member: &'a DomainNewMember, created_at: NaiveDateTime) -> Self {
        Self {
            clinic_id: member.clinic_id.get(),
            email: member.email.as_str(),
            name: member.name.as_str(),
            role: member.role.as_str(),
            is_active: true,
            created_at,
        }
    }
}

impl TryFrom<Invitation> for DomainInvitation {
    type Error = TypeConstraintError;

    fn try_from(invitation: Invitation) -> Result<Self, Self::Error> {
        Ok(Self {
            id: InvitationId::try_from(invitation.id)?,
            clinic_id: ClinicId::try_from(invitation.clinic_id)?,
            email: Email::new(invitation.email)?,
            role: invitation.role.parse()?,
            token: invitation.token,
            status: invitation.status.parse()?,
            invited_by: invitation.invited_by.map(MemberId::try_from).transpose()?,
            expires_at: invitation.expires_at,
            created_at: invitation.created_at,
            accepted_at: invitation.accepted_at,
        })
    }
}

impl<'a> NewInvitation<'a> {
    pub fn from_domain(invitation: &'a DomainNewInvitation, created_at: NaiveDateTime) -> Self {
        Self {
            clinic_id: invitation.clinic_id.get(),
            email: invitation.email.as_str(),
            role: invitation.role.as_str(),
            token: invitation.token.as_str(),
            status: InvitationStatus::Pending.as_str(),
            invited_by: invitation.invited_by.map(MemberId::get),
            expires_at: invitation.expires_at,
            created_at,
        }
    }
}

impl TryFrom<Permission> for DomainPermission {
    type Error = TypeConstraintError;

    fn try_from(row: Permission) -> Result<Self, Self::Error> {
        Ok(Self {
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            role: row.role.parse()?,
            module: row.module.parse()?,
            flags: PermissionFlags::new(row.can_view, row.can_create, row.can_edit, row.can_delete),
        })
    }
}

impl From<&DomainPermission> for Permission {
    fn from(permission: &DomainPermission) -> Self {
        Self {
            clinic_id: permission.clinic_id.get(),
            role: permission.role.as_str().to_string(),
            module: permission.module.as_str().to_string(),
            can_view: permission.flags.can_view,
            can_create: permission.flags.can_create,
            can_edit: permission.flags.can_edit,
            can_delete: permission.flags.can_delete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::Role;
    use crate::domain::permission::Module;

    #[test]
    fn member_row_into_domain() {
        let row = Member {
            id: 1,
            clinic_id: 2,
            email: "Ana@Clinica.com".into(),
            name: "Ana".into(),
            role: "recepcionista".into(),
            is_active: true,
            created_at: chrono::Local::now().naive_local(),
        };
        let member = DomainMember::try_from(row).expect("valid member");
        assert_eq!(member.email.as_str(), "ana@clinica.com");
        assert_eq!(member.role, Role::Receptionist);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let row = Member {
            id: 1,
            clinic_id: 2,
            email: "ana@clinica.com".into(),
            name: "Ana".into(),
            role: "gerente".into(),
            is_active: true,
            created_at: chrono::Local::now().naive_local(),
        };
        assert!(DomainMember::try_from(row).is_err());
    }

    #[test]
    fn permission_row_round_trip() {
        let domain = DomainPermission {
            clinic_id: ClinicId::new(3).unwrap(),
            role: Role::Financial,
            module: Module::Reports,
            flags: PermissionFlags::VIEW,
        };
        let row = Permission::from(&domain);
        assert_eq!(row.module, "relatorios");
        assert_eq!(DomainPermission::try_from(row).unwrap(), domain);
    }
}
