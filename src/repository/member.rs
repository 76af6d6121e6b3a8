//! Members, invitations and permission overrides.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::invitation::{Invitation, InvitationStatus, NewInvitation};
use crate::domain::member::{Member, NewMember, Role};
use crate::domain::permission::Permission;
use crate::domain::types::{ClinicId, Email, InvitationId, MemberId, PersonName};
use crate::models::member::{
    Invitation as DbInvitation, Member as DbMember, NewInvitation as DbNewInvitation,
    NewMember as DbNewMember, Permission as DbPermission,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, InvitationReader, InvitationWriter, MemberReader, MemberWriter,
    PermissionReader, PermissionWriter,
};
use crate::schema::{invitations, members, permissions};

fn into_members(rows: Vec<DbMember>) -> RepositoryResult<Vec<Member>> {
    rows.into_iter()
        .map(|row| Member::try_from(row).map_err(RepositoryError::from))
        .collect()
}

impl MemberReader for DieselRepository {
    fn get_member(&self, clinic_id: ClinicId, id: MemberId) -> RepositoryResult<Option<Member>> {
        let mut conn = self.conn()?;
        let member = members::table
            .filter(members::clinic_id.eq(clinic_id.get()))
            .filter(members::id.eq(id.get()))
            .first::<DbMember>(&mut conn)
            .optional()?;

        Ok(member.map(Member::try_from).transpose()?)
    }

    fn get_member_by_email(
        &self,
        clinic_id: ClinicId,
        email: &Email,
    ) -> RepositoryResult<Option<Member>> {
        let mut conn = self.conn()?;
        let member = members::table
            .filter(members::clinic_id.eq(clinic_id.get()))
            .filter(members::email.eq(email.as_str()))
            .first::<DbMember>(&mut conn)
            .optional()?;

        Ok(member.map(Member::try_from).transpose()?)
    }

    fn list_members(&self, clinic_id: ClinicId) -> RepositoryResult<Vec<Member>> {
        let mut conn = self.conn()?;
        let rows = members::table
            .filter(members::clinic_id.eq(clinic_id.get()))
            .order((members::is_active.desc(), members::name.asc()))
            .load::<DbMember>(&mut conn)?;

        into_members(rows)
    }

    fn count_active_admins(&self, clinic_id: ClinicId) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;
        let count: i64 = members::table
            .filter(members::clinic_id.eq(clinic_id.get()))
            .filter(members::role.eq(Role::Admin.as_str()))
            .filter(members::is_active.eq(true))
            .count()
            .get_result(&mut conn)?;

        Ok(count as usize)
    }
}

impl MemberWriter for DieselRepository {
    fn set_member_role(
        &self,
        clinic_id: ClinicId,
        id: MemberId,
        role: Role,
    ) -> RepositoryResult<Member> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            members::table
                .filter(members::clinic_id.eq(clinic_id.get()))
                .filter(members::id.eq(id.get())),
        )
        .set(members::role.eq(role.as_str()))
        .get_result::<DbMember>(&mut conn)?;

        Ok(Member::try_from(updated)?)
    }

    fn set_member_active(
        &self,
        clinic_id: ClinicId,
        id: MemberId,
        is_active: bool,
    ) -> RepositoryResult<Member> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            members::table
                .filter(members::clinic_id.eq(clinic_id.get()))
                .filter(members::id.eq(id.get())),
        )
        .set(members::is_active.eq(is_active))
        .get_result::<DbMember>(&mut conn)?;

        Ok(Member::try_from(updated)?)
    }
}

impl InvitationReader for DieselRepository {
    fn get_invitation(
        &self,
        clinic_id: ClinicId,
        id: InvitationId,
    ) -> RepositoryResult<Option<Invitation>> {
        let mut conn = self.conn()?;
        let invitation = invitations::table
            .filter(invitations::clinic_id.eq(clinic_id.get()))
            .filter(invitations::id.eq(id.get()))
            .first::<DbInvitation>(&mut conn)
            .optional()?;

        Ok(invitation.map(Invitation::try_from).transpose()?)
    }

    fn get_invitation_by_token(&self, token: &str) -> RepositoryResult<Option<Invitation>> {
        let mut conn = self.conn()?;
        let invitation = invitations::table
            .filter(invitations::token.eq(token))
            .first::<DbInvitation>(&mut conn)
            .optional()?;

        Ok(invitation.map(Invitation::try_from).transpose()?)
    }

    fn list_invitations(&self, clinic_id: ClinicId) -> RepositoryResult<Vec<Invitation>> {
        let mut conn = self.conn()?;
        let rows = invitations::table
            .filter(invitations::clinic_id.eq(clinic_id.get()))
            .order(invitations::created_at.desc())
            .load::<DbInvitation>(&mut conn)?;

        rows.into_iter()
            .map(|row| Invitation::try_from(row).map_err(RepositoryError::from))
            .collect()
    }

    fn find_open_invitation(
        &self,
        clinic_id: ClinicId,
        email: &Email,
        now: NaiveDateTime,
    ) -> RepositoryResult<Option<Invitation>> {
        let mut conn = self.conn()?;
        let invitation = invitations::table
            .filter(invitations::clinic_id.eq(clinic_id.get()))
            .filter(invitations::email.eq(email.as_str()))
            .filter(invitations::status.eq(InvitationStatus::Pending.as_str()))
            .filter(invitations::expires_at.gt(now))
            .first::<DbInvitation>(&mut conn)
            .optional()?;

        Ok(invitation.map(Invitation::try_from).transpose()?)
    }
}

impl InvitationWriter for DieselRepository {
    fn create_invitation(&self, invitation: &NewInvitation) -> RepositoryResult<Invitation> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(invitations::table)
            .values(&DbNewInvitation::from_domain(invitation, super::now()))
            .get_result::<DbInvitation>(&mut conn)?;

        Ok(Invitation::try_from(created)?)
    }

    fn revoke_invitation(
        &self,
        clinic_id: ClinicId,
        id: InvitationId,
    ) -> RepositoryResult<Invitation> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            invitations::table
                .filter(invitations::clinic_id.eq(clinic_id.get()))
                .filter(invitations::id.eq(id.get()))
                .filter(invitations::status.eq(InvitationStatus::Pending.as_str())),
        )
        .set(invitations::status.eq(InvitationStatus::Revoked.as_str()))
        .get_result::<DbInvitation>(&mut conn)?;

        Ok(Invitation::try_from(updated)?)
    }

    fn accept_invitation(
        &self,
        invitation: &Invitation,
        name: &PersonName,
        now: NaiveDateTime,
    ) -> RepositoryResult<Member> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let accepted = diesel::update(
                invitations::table
                    .filter(invitations::id.eq(invitation.id.get()))
                    .filter(invitations::status.eq(InvitationStatus::Pending.as_str())),
            )
            .set((
                invitations::status.eq(InvitationStatus::Accepted.as_str()),
                invitations::accepted_at.eq(Some(now)),
            ))
            .execute(conn)?;
            if accepted == 0 {
                return Err(RepositoryError::NotFound);
            }

            let existing = members::table
                .filter(members::clinic_id.eq(invitation.clinic_id.get()))
                .filter(members::email.eq(invitation.email.as_str()))
                .first::<DbMember>(conn)
                .optional()?;

            let member = match existing {
                Some(existing) => diesel::update(members::table.find(existing.id))
                    .set((
                        members::role.eq(invitation.role.as_str()),
                        members::is_active.eq(true),
                    ))
                    .get_result::<DbMember>(conn)?,
                None => {
                    let new_member = NewMember::new(
                        invitation.clinic_id,
                        invitation.email.clone(),
                        name.clone(),
                        invitation.role,
                    );
                    diesel::insert_into(members::table)
                        .values(&DbNewMember::from_domain(&new_member, now))
                        .get_result::<DbMember>(conn)?
                }
            };

            Ok(Member::try_from(member)?)
        })
    }
}

impl PermissionReader for DieselRepository {
    fn list_permission_overrides(&self, clinic_id: ClinicId) -> RepositoryResult<Vec<Permission>> {
        let mut conn = self.conn()?;
        let rows = permissions::table
            .filter(permissions::clinic_id.eq(clinic_id.get()))
            .load::<DbPermission>(&mut conn)?;

        rows.into_iter()
            .map(|row| Permission::try_from(row).map_err(RepositoryError::from))
            .collect()
    }
}

impl PermissionWriter for DieselRepository {
    fn upsert_permission(&self, permission: &Permission) -> RepositoryResult<Permission> {
        let mut conn = self.conn()?;
        let row = DbPermission::from(permission);

        let saved = diesel::insert_into(permissions::table)
            .values(&row)
            .on_conflict((permissions::clinic_id, permissions::role, permissions::module))
            .do_update()
            .set(&row)
            .get_result::<DbPermission>(&mut conn)?;

        Ok(Permission::try_from(saved)?)
    }
}
