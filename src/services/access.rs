//! Membership and permission checks shared by every clinic-scoped service.

use crate::domain::member::{Member, Role};
use crate::domain::permission::{Action, Module, PermissionMatrix};
use crate::domain::types::ClinicId;
use crate::models::auth::AuthenticatedUser;
use crate::repository::{MemberReader, PermissionReader};
use crate::services::{ServiceError, ServiceResult, log_failure};

/// Active membership of the caller in `clinic_id`.
pub fn active_member<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
) -> ServiceResult<Member>
where
    R: MemberReader + ?Sized,
{
    let email = user.email_address()?;
    repo.get_member_by_email(clinic_id, &email)
        .map_err(log_failure("Failed to load membership"))?
        .filter(|member| member.is_active)
        .ok_or(ServiceError::Forbidden)
}

/// Defaults merged with the clinic's stored overrides for `role`.
pub fn effective_permissions<R>(
    repo: &R,
    clinic_id: ClinicId,
    role: Role,
) -> ServiceResult<PermissionMatrix>
where
    R: PermissionReader + ?Sized,
{
    let overrides = repo
        .list_permission_overrides(clinic_id)
        .map_err(log_failure("Failed to load permissions"))?;
    Ok(PermissionMatrix::resolve(role, &overrides))
}

/// Returns the caller's membership when its role may perform `action` on `module`.
pub fn ensure_permission<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    module: Module,
    action: Action,
) -> ServiceResult<Member>
where
    R: MemberReader + PermissionReader + ?Sized,
{
    let member = active_member(repo, user, clinic_id)?;
    if !effective_permissions(repo, clinic_id, member.role)?.allows(module, action) {
        log::warn!(
            "{} denied {module}:{action:?} in clinic {clinic_id}",
            member.email
        );
        return Err(ServiceError::Forbidden);
    }
    Ok(member)
}

#[cfg(all(test, feature = "test-mocks"))]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::types::{Email, MemberId, PersonName};
    use crate::repository::mock::MockRepository;

    pub fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "1".into(),
            email: "ana@clinica.com".into(),
            name: "Ana".into(),
            exp: 0,
        }
    }

    pub fn clinic() -> ClinicId {
        ClinicId::new(1).unwrap()
    }

    pub fn member(role: Role) -> Member {
        Member {
            id: MemberId::new(10).unwrap(),
            clinic_id: clinic(),
            email: Email::new("ana@clinica.com").unwrap(),
            name: PersonName::new("Ana").unwrap(),
            role,
            is_active: true,
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    /// Repository in which the test user holds `role` and no overrides exist.
    pub fn repo_as(role: Role) -> MockRepository {
        let mut repo = MockRepository::new();
        repo.expect_get_member_by_email()
            .returning(move |_, _| Ok(Some(member(role))));
        repo.expect_list_permission_overrides()
            .returning(|_| Ok(vec![]));
        repo
    }
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::domain::permission::{Permission, PermissionFlags};
    use crate::repository::mock::MockRepository;

    #[test]
    fn non_member_is_forbidden() {
        let mut repo = MockRepository::new();
        repo.expect_get_member_by_email().returning(|_, _| Ok(None));

        let result = ensure_permission(&repo, &user(), clinic(), Module::Patients, Action::View);
        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn inactive_member_is_forbidden() {
        let mut repo = MockRepository::new();
        repo.expect_get_member_by_email().returning(|_, _| {
            Ok(Some(Member {
                is_active: false,
                ..member(Role::Admin)
            }))
        });

        let result = ensure_permission(&repo, &user(), clinic(), Module::Patients, Action::View);
        assert!(matches!(result, Err(ServiceError::Forbidden)));
    }

    #[test]
    fn default_matrix_applies_without_overrides() {
        let repo = repo_as(Role::Financial);

        assert!(ensure_permission(&repo, &user(), clinic(), Module::Financial, Action::Delete).is_ok());
        assert!(matches!(
            ensure_permission(&repo, &user(), clinic(), Module::MedicalRecords, Action::View),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn stored_override_wins_over_default() {
        let mut repo = MockRepository::new();
        repo.expect_get_member_by_email()
            .returning(|_, _| Ok(Some(member(Role::Receptionist))));
        repo.expect_list_permission_overrides().returning(|clinic_id| {
            Ok(vec![Permission {
                clinic_id,
                role: Role::Receptionist,
                module: Module::Agenda,
                flags: PermissionFlags::VIEW,
            }])
        });

        assert!(ensure_permission(&repo, &user(), clinic(), Module::Agenda, Action::View).is_ok());
        assert!(matches!(
            ensure_permission(&repo, &user(), clinic(), Module::Agenda, Action::Create),
            Err(ServiceError::Forbidden)
        ));
    }
}
