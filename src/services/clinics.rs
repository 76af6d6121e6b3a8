//! Tenant creation, selection and clinic settings.

use crate::domain::clinic::{ClinicSettings, NewClinic};
use crate::domain::permission::{Action, Module};
use crate::domain::types::ClinicId;
use crate::dto::clinics::ClinicMembership;
use crate::forms::clinics::{CreateClinicForm, SettingsForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{ClinicReader, ClinicWriter, MemberReader, PermissionReader};
use crate::services::access::{active_member, ensure_permission};
use crate::services::{ServiceError, ServiceResult, log_failure};

/// Creates a clinic administered by the caller.
pub fn create_clinic<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: CreateClinicForm,
) -> ServiceResult<ClinicMembership>
where
    R: ClinicWriter + ?Sized,
{
    let new_clinic = NewClinic::try_from(form)?;
    let email = user.email_address()?;
    let name = user.person_name()?;

    let (clinic, admin) = repo
        .create_clinic(&new_clinic, &email, &name)
        .map_err(log_failure("Failed to create clinic"))?;
    log::info!("{email} created clinic {} ({})", clinic.id, clinic.name);

    Ok(ClinicMembership::new(clinic, &admin))
}

/// Clinics in which the caller holds an active membership.
pub fn list_my_clinics<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<ClinicMembership>>
where
    R: ClinicReader + ?Sized,
{
    let email = user.email_address()?;
    let clinics = repo
        .list_clinics_for_email(&email)
        .map_err(log_failure("Failed to list clinics"))?
        .into_iter()
        .map(|(clinic, member)| ClinicMembership::new(clinic, &member))
        .collect();
    Ok(clinics)
}

/// Confirms the caller may work in `clinic_id`; the route then stores the
/// choice in the session.
pub fn select_clinic<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: i32,
) -> ServiceResult<ClinicMembership>
where
    R: ClinicReader + MemberReader + ?Sized,
{
    let clinic_id = ClinicId::new(clinic_id)?;
    let member = active_member(repo, user, clinic_id)?;
    let clinic = repo
        .get_clinic(clinic_id)
        .map_err(log_failure("Failed to load clinic"))?
        .ok_or(ServiceError::NotFound)?;
    Ok(ClinicMembership::new(clinic, &member))
}

pub fn get_settings<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
) -> ServiceResult<ClinicSettings>
where
    R: ClinicReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Settings, Action::View)?;
    let settings = repo
        .get_settings(clinic_id)
        .map_err(log_failure("Failed to load clinic settings"))?
        .unwrap_or_else(|| ClinicSettings::defaults(clinic_id));
    Ok(settings)
}

pub fn update_settings<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: SettingsForm,
) -> ServiceResult<ClinicSettings>
where
    R: ClinicWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Settings, Action::Edit)?;
    let settings = form.into_settings(clinic_id)?;
    let saved = repo
        .update_settings(&settings)
        .map_err(log_failure("Failed to save clinic settings"))?;
    Ok(saved)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::clinic::Clinic;
    use crate::domain::member::Role;
    use crate::domain::types::ClinicName;
    use crate::repository::mock::MockRepository;
    use crate::services::access::test_support::*;

    fn sample_clinic() -> Clinic {
        Clinic {
            id: clinic(),
            name: ClinicName::new("Clínica Movimento").unwrap(),
            created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn settings_form(opening: &str, closing: &str) -> SettingsForm {
        SettingsForm {
            phone: None,
            email: None,
            address: None,
            opening_time: opening.into(),
            closing_time: closing.into(),
            slot_minutes: 30,
            working_days: vec![1, 2, 3, 4, 5, 6],
            default_session_price: "120,00".into(),
        }
    }

    #[test]
    fn creator_becomes_admin() {
        let mut repo = MockRepository::new();
        repo.expect_create_clinic()
            .withf(|clinic, email, _| {
                clinic.name.as_str() == "Clínica Movimento" && email.as_str() == "ana@clinica.com"
            })
            .returning(|_, _, _| Ok((sample_clinic(), member(Role::Admin))));

        let created = create_clinic(
            &repo,
            &user(),
            CreateClinicForm {
                name: "Clínica Movimento".into(),
            },
        )
        .unwrap();
        assert_eq!(created.role, Role::Admin);
        assert_eq!(created.clinic.id, clinic());
    }

    #[test]
    fn selecting_a_foreign_clinic_is_forbidden() {
        let mut repo = MockRepository::new();
        repo.expect_get_member_by_email().returning(|_, _| Ok(None));
        repo.expect_get_clinic().never();

        assert!(matches!(
            select_clinic(&repo, &user(), 2),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn missing_settings_fall_back_to_defaults() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_get_settings().returning(|_| Ok(None));

        let settings = get_settings(&repo, &user(), clinic()).unwrap();
        assert_eq!(settings, ClinicSettings::defaults(clinic()));
    }

    #[test]
    fn settings_require_permission() {
        let repo = repo_as(Role::Receptionist);
        assert!(matches!(
            update_settings(&repo, &user(), clinic(), settings_form("08:00", "18:00")),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn inverted_hours_are_rejected() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_update_settings().never();

        assert!(matches!(
            update_settings(&repo, &user(), clinic(), settings_form("19:00", "08:00")),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn valid_settings_are_saved() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_update_settings()
            .returning(|settings| Ok(settings.clone()));

        let saved = update_settings(&repo, &user(), clinic(), settings_form("07:00", "20:00")).unwrap();
        assert_eq!(saved.slot_minutes, 30);
        assert_eq!(saved.default_session_price.cents(), 12_000);
    }
}
