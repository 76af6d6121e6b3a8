use chrono::NaiveDate;

use crate::domain::finance::{Receivable, ReceivableDetails};
use crate::domain::package::SessionPackage;
use crate::domain::permission::{Action, Module};
use crate::domain::types::{ClinicId, PackageId, PatientId};
use crate::dto::patients::PackageBalance;
use crate::forms::packages::{PackageForm, PackagePayload};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    MemberReader, PackageReader, PackageWriter, PatientReader, PermissionReader,
};
use crate::services::access::{effective_permissions, ensure_permission};
use crate::services::patients::load_patient;
use crate::services::{ServiceError, ServiceResult, log_failure};

pub const RECEIVABLE_CATEGORY: &str = "pacote";

/// Sells a package to a patient. With `generate_receivable` the price is
/// also booked as a receivable due on the purchase date, which requires
/// `financeiro:create`.
pub fn create_package<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: PackageForm,
    today: NaiveDate,
) -> ServiceResult<(PackageBalance, Option<Receivable>)>
where
    R: PackageWriter + PatientReader + MemberReader + PermissionReader + ?Sized,
{
    let member = ensure_permission(repo, user, clinic_id, Module::Agenda, Action::Create)?;
    let PackagePayload {
        package,
        generate_receivable,
    } = form.into_payload(clinic_id, today)?;

    let patient = load_patient(repo, clinic_id, package.patient_id)?;
    if !patient.is_active {
        return Err(ServiceError::Form("Paciente inativo".to_string()));
    }

    let receivable = if generate_receivable {
        if !effective_permissions(repo, clinic_id, member.role)?
            .allows(Module::Financial, Action::Create)
        {
            return Err(ServiceError::Forbidden);
        }
        Some(ReceivableDetails {
            patient_id: Some(patient.id),
            description: package.name.clone(),
            category: Some(RECEIVABLE_CATEGORY.to_string()),
            amount: package.price,
            due_date: package.purchased_at,
            notes: None,
        })
    } else {
        None
    };

    let (created, receivable) = repo
        .create_package(&package, receivable.as_ref())
        .map_err(log_failure("Failed to create package"))?;
    Ok((PackageBalance::new(created, today), receivable))
}

pub fn list_packages<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    patient_id: i32,
    today: NaiveDate,
) -> ServiceResult<Vec<PackageBalance>>
where
    R: PackageReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    let packages = repo
        .list_packages(clinic_id, PatientId::new(patient_id)?)
        .map_err(log_failure("Failed to list packages"))?
        .into_iter()
        .map(|package| PackageBalance::new(package, today))
        .collect();
    Ok(packages)
}

fn load_package<R>(repo: &R, clinic_id: ClinicId, package_id: i32) -> ServiceResult<SessionPackage>
where
    R: PackageReader + ?Sized,
{
    repo.get_package(clinic_id, PackageId::new(package_id)?)
        .map_err(log_failure("Failed to load package"))?
        .ok_or(ServiceError::NotFound)
}

pub fn get_package<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    package_id: i32,
    today: NaiveDate,
) -> ServiceResult<PackageBalance>
where
    R: PackageReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    Ok(PackageBalance::new(load_package(repo, clinic_id, package_id)?, today))
}

pub fn deactivate_package<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    package_id: i32,
    today: NaiveDate,
) -> ServiceResult<PackageBalance>
where
    R: PackageReader + PackageWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::Delete)?;
    let package = load_package(repo, clinic_id, package_id)?;
    let updated = repo
        .set_package_active(clinic_id, package.id, false)
        .map_err(log_failure("Failed to deactivate package"))?;
    Ok(PackageBalance::new(updated, today))
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::domain::member::Role;
    use crate::domain::package::{NewSessionPackage, PackageStatus};
    use crate::domain::patient::Patient;
    use crate::domain::permission::{Permission, PermissionFlags};
    use crate::domain::types::{PersonName, ReceivableId};
    use crate::repository::mock::MockRepository;
    use crate::services::access::test_support::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn stamp() -> NaiveDateTime {
        today().and_hms_opt(10, 0, 0).unwrap()
    }

    fn patient(id: PatientId) -> Patient {
        Patient {
            id,
            clinic_id: clinic(),
            name: PersonName::new("Maria").unwrap(),
            cpf: None,
            birth_date: None,
            phone: None,
            email: None,
            address: None,
            health_insurance: None,
            emergency_contact: None,
            notes: None,
            is_active: true,
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    fn stored(new: &NewSessionPackage) -> SessionPackage {
        SessionPackage {
            id: PackageId::new(7).unwrap(),
            clinic_id: new.clinic_id,
            patient_id: new.patient_id,
            name: new.name.clone(),
            total_sessions: new.total_sessions,
            used_sessions: 0,
            price: new.price,
            purchased_at: new.purchased_at,
            expires_at: new.expires_at,
            is_active: true,
            created_at: stamp(),
        }
    }

    fn form(generate_receivable: bool) -> PackageForm {
        PackageForm {
            patient_id: 1,
            name: "Pacote 10 sessões".into(),
            total_sessions: 10,
            price: "900".into(),
            purchased_at: None,
            expires_at: None,
            generate_receivable,
        }
    }

    #[test]
    fn package_with_receivable() {
        let mut repo = repo_as(Role::Receptionist);
        repo.expect_get_patient()
            .returning(|_, id| Ok(Some(patient(id))));
        repo.expect_create_package()
            .withf(|_, receivable| {
                receivable.is_some_and(|r| r.amount.cents() == 90_000 && r.due_date == today())
            })
            .returning(|new, details| {
                let receivable = details.map(|d| Receivable {
                    id: ReceivableId::new(1).unwrap(),
                    clinic_id: new.clinic_id,
                    patient_id: d.patient_id,
                    package_id: Some(PackageId::new(7).unwrap()),
                    description: d.description.clone(),
                    category: d.category.clone(),
                    amount: d.amount,
                    due_date: d.due_date,
                    paid_date: None,
                    payment_method: None,
                    notes: None,
                    created_at: stamp(),
                });
                Ok((stored(new), receivable))
            });

        let (package, receivable) =
            create_package(&repo, &user(), clinic(), form(true), today()).unwrap();
        assert_eq!(package.remaining_sessions, 10);
        assert_eq!(package.status, PackageStatus::Active);
        assert_eq!(
            receivable.unwrap().category.as_deref(),
            Some(RECEIVABLE_CATEGORY)
        );
    }

    #[test]
    fn receivable_needs_financial_permission() {
        let mut repo = MockRepository::new();
        repo.expect_get_member_by_email()
            .returning(|_, _| Ok(Some(member(Role::Receptionist))));
        repo.expect_list_permission_overrides().returning(|clinic_id| {
            Ok(vec![Permission {
                clinic_id,
                role: Role::Receptionist,
                module: Module::Financial,
                flags: PermissionFlags::VIEW,
            }])
        });
        repo.expect_get_patient()
            .returning(|_, id| Ok(Some(patient(id))));
        repo.expect_create_package().never();

        assert!(matches!(
            create_package(&repo, &user(), clinic(), form(true), today()),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn financial_role_cannot_sell_packages() {
        let repo = repo_as(Role::Financial);
        assert!(matches!(
            create_package(&repo, &user(), clinic(), form(false), today()),
            Err(ServiceError::Forbidden)
        ));
    }
}
