//! Clinic users: memberships, invitations and the permission matrix.

use chrono::{Duration, NaiveDateTime};

use crate::domain::invitation::{Invitation, NewInvitation};
use crate::domain::member::{Member, Role};
use crate::domain::permission::{Action, Module, Permission, PermissionMatrix};
use crate::domain::types::{ClinicId, InvitationId, MemberId};
use crate::dto::clinics::ClinicMembership;
use crate::dto::members::InvitationView;
use crate::forms::members::{
    AcceptInvitationForm, ChangeRoleForm, InvitationForm, InvitationPayload, PermissionForm,
};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    ClinicReader, InvitationReader, InvitationWriter, MemberReader, MemberWriter,
    PermissionReader, PermissionWriter,
};
use crate::services::access::ensure_permission;
use crate::services::{ServiceError, ServiceResult, log_failure};

const LAST_ADMIN: &str = "A clínica precisa de pelo menos um administrador ativo";

pub fn list_members<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
) -> ServiceResult<Vec<Member>>
where
    R: MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Users, Action::View)?;
    let members = repo
        .list_members(clinic_id)
        .map_err(log_failure("Failed to list members"))?;
    Ok(members)
}

fn load_member<R>(repo: &R, clinic_id: ClinicId, member_id: MemberId) -> ServiceResult<Member>
where
    R: MemberReader + ?Sized,
{
    repo.get_member(clinic_id, member_id)
        .map_err(log_failure("Failed to load member"))?
        .ok_or(ServiceError::NotFound)
}

/// Fails when removing `member` from the admins would leave the clinic without one.
fn ensure_not_last_admin<R>(repo: &R, member: &Member) -> ServiceResult<()>
where
    R: MemberReader + ?Sized,
{
    if member.role != Role::Admin || !member.is_active {
        return Ok(());
    }
    let admins = repo
        .count_active_admins(member.clinic_id)
        .map_err(log_failure("Failed to count admins"))?;
    if admins <= 1 {
        return Err(ServiceError::Conflict(LAST_ADMIN.to_string()));
    }
    Ok(())
}

pub fn change_role<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    member_id: i32,
    form: ChangeRoleForm,
) -> ServiceResult<Member>
where
    R: MemberReader + MemberWriter + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Users, Action::Edit)?;
    let target = load_member(repo, clinic_id, MemberId::new(member_id)?)?;
    if target.role == form.role {
        return Ok(target);
    }
    ensure_not_last_admin(repo, &target)?;

    let updated = repo
        .set_member_role(clinic_id, target.id, form.role)
        .map_err(log_failure("Failed to change member role"))?;
    log::info!(
        "{} changed role of {} to {} in clinic {clinic_id}",
        user.email,
        updated.email,
        updated.role
    );
    Ok(updated)
}

pub fn deactivate_member<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    member_id: i32,
) -> ServiceResult<Member>
where
    R: MemberReader + MemberWriter + PermissionReader + ?Sized,
{
    let caller = ensure_permission(repo, user, clinic_id, Module::Users, Action::Delete)?;
    let target = load_member(repo, clinic_id, MemberId::new(member_id)?)?;
    if target.id == caller.id {
        return Err(ServiceError::Conflict(
            "Você não pode desativar o próprio usuário".to_string(),
        ));
    }
    ensure_not_last_admin(repo, &target)?;

    let updated = repo
        .set_member_active(clinic_id, target.id, false)
        .map_err(log_failure("Failed to deactivate member"))?;
    Ok(updated)
}

/// Invites `form.email` with `form.role`; the invitation stays open for `ttl_days`.
pub fn create_invitation<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: InvitationForm,
    now: NaiveDateTime,
    ttl_days: i64,
) -> ServiceResult<Invitation>
where
    R: MemberReader + PermissionReader + InvitationReader + InvitationWriter + ?Sized,
{
    let caller = ensure_permission(repo, user, clinic_id, Module::Users, Action::Create)?;
    let payload = InvitationPayload::try_from(form)?;

    let existing = repo
        .get_member_by_email(clinic_id, &payload.email)
        .map_err(log_failure("Failed to check membership"))?;
    if existing.is_some_and(|member| member.is_active) {
        return Err(ServiceError::Conflict(
            "Este e-mail já é usuário da clínica".to_string(),
        ));
    }
    let open = repo
        .find_open_invitation(clinic_id, &payload.email, now)
        .map_err(log_failure("Failed to check invitations"))?;
    if open.is_some() {
        return Err(ServiceError::Conflict(
            "Já existe um convite pendente para este e-mail".to_string(),
        ));
    }

    let invitation = NewInvitation::new(
        clinic_id,
        payload.email,
        payload.role,
        Some(caller.id),
        now + Duration::days(ttl_days),
    );
    let created = repo
        .create_invitation(&invitation)
        .map_err(log_failure("Failed to create invitation"))?;
    log::info!(
        "{} invited {} as {} to clinic {clinic_id}",
        caller.email,
        created.email,
        created.role
    );
    Ok(created)
}

pub fn list_invitations<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    now: NaiveDateTime,
) -> ServiceResult<Vec<InvitationView>>
where
    R: MemberReader + PermissionReader + InvitationReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Users, Action::View)?;
    let invitations = repo
        .list_invitations(clinic_id)
        .map_err(log_failure("Failed to list invitations"))?
        .into_iter()
        .map(|invitation| InvitationView::new(invitation, now))
        .collect();
    Ok(invitations)
}

pub fn revoke_invitation<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    invitation_id: i32,
    now: NaiveDateTime,
) -> ServiceResult<InvitationView>
where
    R: MemberReader + PermissionReader + InvitationReader + InvitationWriter + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Users, Action::Delete)?;
    let invitation = repo
        .get_invitation(clinic_id, InvitationId::new(invitation_id)?)
        .map_err(log_failure("Failed to load invitation"))?
        .ok_or(ServiceError::NotFound)?;
    if !invitation.is_acceptable(now) {
        return Err(ServiceError::Conflict(
            "Apenas convites pendentes podem ser revogados".to_string(),
        ));
    }

    let revoked = repo
        .revoke_invitation(clinic_id, invitation.id)
        .map_err(log_failure("Failed to revoke invitation"))?;
    Ok(InvitationView::new(revoked, now))
}

/// Joins the caller to the inviting clinic. Works before any clinic is selected.
pub fn accept_invitation<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: AcceptInvitationForm,
    now: NaiveDateTime,
) -> ServiceResult<ClinicMembership>
where
    R: ClinicReader + InvitationReader + InvitationWriter + ?Sized,
{
    let email = user.email_address()?;
    let invitation = repo
        .get_invitation_by_token(form.token.trim())
        .map_err(log_failure("Failed to load invitation"))?
        .ok_or(ServiceError::NotFound)?;
    if invitation.email != email {
        log::warn!("{email} tried to accept an invitation for {}", invitation.email);
        return Err(ServiceError::Forbidden);
    }
    if !invitation.is_acceptable(now) {
        return Err(ServiceError::Conflict(
            "Convite expirado ou já utilizado".to_string(),
        ));
    }

    let member = repo
        .accept_invitation(&invitation, &user.person_name()?, now)
        .map_err(log_failure("Failed to accept invitation"))?;
    let clinic = repo
        .get_clinic(invitation.clinic_id)
        .map_err(log_failure("Failed to load clinic"))?
        .ok_or(ServiceError::NotFound)?;
    Ok(ClinicMembership::new(clinic, &member))
}

/// Effective matrix of every role.
pub fn list_permissions<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
) -> ServiceResult<Vec<PermissionMatrix>>
where
    R: MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Users, Action::View)?;
    let overrides = repo
        .list_permission_overrides(clinic_id)
        .map_err(log_failure("Failed to load permissions"))?;
    Ok(Role::ALL
        .into_iter()
        .map(|role| PermissionMatrix::resolve(role, &overrides))
        .collect())
}

pub fn update_permission<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: PermissionForm,
) -> ServiceResult<PermissionMatrix>
where
    R: MemberReader + PermissionReader + PermissionWriter + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Users, Action::Edit)?;
    if form.role == Role::Admin {
        return Err(ServiceError::Form(
            "As permissões do administrador não podem ser alteradas".to_string(),
        ));
    }

    let permission = Permission {
        clinic_id,
        role: form.role,
        module: form.module,
        flags: form.flags(),
    };
    repo.upsert_permission(&permission)
        .map_err(log_failure("Failed to save permission"))?;

    let overrides = repo
        .list_permission_overrides(clinic_id)
        .map_err(log_failure("Failed to load permissions"))?;
    Ok(PermissionMatrix::resolve(form.role, &overrides))
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::invitation::InvitationStatus;
    use crate::domain::permission::PermissionFlags;
    use crate::domain::types::{Email, PersonName};
    use crate::repository::mock::MockRepository;
    use crate::services::access::test_support::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn other(id: i32, role: Role) -> Member {
        Member {
            id: MemberId::new(id).unwrap(),
            email: Email::new(format!("user{id}@clinica.com")).unwrap(),
            name: PersonName::new("Outro").unwrap(),
            ..member(role)
        }
    }

    fn invitation(status: InvitationStatus, expires_at: NaiveDateTime) -> Invitation {
        Invitation {
            id: InvitationId::new(5).unwrap(),
            clinic_id: clinic(),
            email: Email::new("ana@clinica.com").unwrap(),
            role: Role::Physiotherapist,
            token: "abc".into(),
            status,
            invited_by: None,
            expires_at,
            created_at: now() - Duration::days(1),
            accepted_at: None,
        }
    }

    #[test]
    fn last_admin_cannot_be_demoted() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_get_member()
            .returning(|_, _| Ok(Some(other(11, Role::Admin))));
        repo.expect_count_active_admins().returning(|_| Ok(1));
        repo.expect_set_member_role().never();

        let result = change_role(
            &repo,
            &user(),
            clinic(),
            11,
            ChangeRoleForm {
                role: Role::Receptionist,
            },
        );
        assert!(matches!(result, Err(ServiceError::Conflict(msg)) if msg == LAST_ADMIN));
    }

    #[test]
    fn role_change_with_other_admins() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_get_member()
            .returning(|_, _| Ok(Some(other(11, Role::Admin))));
        repo.expect_count_active_admins().returning(|_| Ok(2));
        repo.expect_set_member_role()
            .returning(|_, id, role| {
                Ok(Member {
                    role,
                    ..other(id.get(), Role::Admin)
                })
            });

        let updated = change_role(
            &repo,
            &user(),
            clinic(),
            11,
            ChangeRoleForm {
                role: Role::Financial,
            },
        )
        .unwrap();
        assert_eq!(updated.role, Role::Financial);
    }

    #[test]
    fn members_cannot_deactivate_themselves() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_get_member()
            .returning(|_, _| Ok(Some(member(Role::Admin))));
        repo.expect_set_member_active().never();

        assert!(matches!(
            deactivate_member(&repo, &user(), clinic(), 10),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn physiotherapist_cannot_manage_users() {
        let repo = repo_as(Role::Physiotherapist);
        assert!(matches!(
            list_members(&repo, &user(), clinic()),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn duplicate_pending_invitation_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_member_by_email().returning(|_, email| {
            Ok((email.as_str() == "ana@clinica.com").then(|| member(Role::Admin)))
        });
        repo.expect_list_permission_overrides().returning(|_| Ok(vec![]));
        repo.expect_find_open_invitation()
            .returning(|_, _, _| Ok(Some(invitation(InvitationStatus::Pending, now()))));
        repo.expect_create_invitation().never();

        let form = InvitationForm {
            email: "novo@clinica.com".into(),
            role: Role::Receptionist,
        };
        assert!(matches!(
            create_invitation(&repo, &user(), clinic(), form, now(), 7),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn invitation_expires_after_ttl() {
        let mut repo = MockRepository::new();
        repo.expect_get_member_by_email().returning(|_, email| {
            Ok((email.as_str() == "ana@clinica.com").then(|| member(Role::Admin)))
        });
        repo.expect_list_permission_overrides().returning(|_| Ok(vec![]));
        repo.expect_find_open_invitation().returning(|_, _, _| Ok(None));
        repo.expect_create_invitation()
            .withf(|new| new.expires_at == now() + Duration::days(7) && !new.token.is_empty())
            .returning(|new| {
                Ok(Invitation {
                    email: new.email.clone(),
                    role: new.role,
                    token: new.token.clone(),
                    expires_at: new.expires_at,
                    ..invitation(InvitationStatus::Pending, new.expires_at)
                })
            });

        let form = InvitationForm {
            email: "novo@clinica.com".into(),
            role: Role::Receptionist,
        };
        let created = create_invitation(&repo, &user(), clinic(), form, now(), 7).unwrap();
        assert_eq!(created.email.as_str(), "novo@clinica.com");
    }

    #[test]
    fn expired_invitation_cannot_be_accepted() {
        let mut repo = MockRepository::new();
        repo.expect_get_invitation_by_token().returning(|_| {
            Ok(Some(invitation(
                InvitationStatus::Pending,
                now() - Duration::hours(1),
            )))
        });
        repo.expect_accept_invitation().never();

        let form = AcceptInvitationForm { token: "abc".into() };
        assert!(matches!(
            accept_invitation(&repo, &user(), form, now()),
            Err(ServiceError::Conflict(_))
        ));
    }

    #[test]
    fn invitation_for_another_email_is_forbidden() {
        let mut repo = MockRepository::new();
        repo.expect_get_invitation_by_token().returning(|_| {
            Ok(Some(Invitation {
                email: Email::new("bia@clinica.com").unwrap(),
                ..invitation(InvitationStatus::Pending, now() + Duration::days(1))
            }))
        });

        let form = AcceptInvitationForm { token: "abc".into() };
        assert!(matches!(
            accept_invitation(&repo, &user(), form, now()),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn admin_permissions_are_fixed() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_upsert_permission().never();

        let form = PermissionForm {
            role: Role::Admin,
            module: Module::Financial,
            can_view: false,
            can_create: false,
            can_edit: false,
            can_delete: false,
        };
        assert!(matches!(
            update_permission(&repo, &user(), clinic(), form),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn matrix_lists_every_role() {
        let repo = repo_as(Role::Admin);
        let matrices = list_permissions(&repo, &user(), clinic()).unwrap();
        assert_eq!(matrices.len(), Role::ALL.len());
        let receptionist = matrices
            .iter()
            .find(|m| m.role == Role::Receptionist)
            .unwrap();
        assert_eq!(
            receptionist.modules[&Module::MedicalRecords],
            PermissionFlags::NONE
        );
    }
}
