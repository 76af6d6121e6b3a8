use std::collections::HashSet;
use std::io::Read;

use chrono::NaiveDate;

use crate::domain::patient::{NewPatient, Patient, PatientDetails, PatientListQuery};
use crate::domain::permission::{Action, Module};
use crate::domain::types::{ClinicId, PatientId};
use crate::dto::patients::{ImportOutcome, PackageBalance, PatientHistory, PatientsQuery};
use crate::forms::FormError;
use crate::forms::patients::{PatientForm, parse_patients_csv};
use crate::models::auth::AuthenticatedUser;
use crate::pagination::Paginated;
use crate::repository::{
    AppointmentReader, MedicalReader, MemberReader, PackageReader, PatientReader, PatientWriter,
    PermissionReader,
};
use crate::services::access::{effective_permissions, ensure_permission};
use crate::services::{ServiceError, ServiceResult, log_failure};

const DUPLICATE_CPF: &str = "Já existe um paciente com este CPF";

pub fn list_patients<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    query: PatientsQuery,
    per_page: usize,
) -> ServiceResult<Paginated<Patient>>
where
    R: PatientReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Patients, Action::View)?;

    let page = query.page.unwrap_or(1).max(1);
    let list_query = PatientListQuery {
        search: query.search.filter(|s| !s.trim().is_empty()),
        include_inactive: query.include_inactive,
        page,
        per_page,
    };
    let (total, patients) = repo
        .list_patients(clinic_id, &list_query)
        .map_err(log_failure("Failed to list patients"))?;
    Ok(Paginated::new(patients, total, page, per_page))
}

pub(crate) fn load_patient<R>(
    repo: &R,
    clinic_id: ClinicId,
    patient_id: PatientId,
) -> ServiceResult<Patient>
where
    R: PatientReader + ?Sized,
{
    repo.get_patient(clinic_id, patient_id)
        .map_err(log_failure("Failed to load patient"))?
        .ok_or(ServiceError::NotFound)
}

pub fn get_patient<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    patient_id: i32,
) -> ServiceResult<Patient>
where
    R: PatientReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Patients, Action::View)?;
    load_patient(repo, clinic_id, PatientId::new(patient_id)?)
}

/// Rejects a CPF already registered to another patient of the clinic.
fn ensure_unique_cpf<R>(
    repo: &R,
    clinic_id: ClinicId,
    details: &PatientDetails,
    current: Option<PatientId>,
) -> ServiceResult<()>
where
    R: PatientReader + ?Sized,
{
    let Some(cpf) = &details.cpf else {
        return Ok(());
    };
    let existing = repo
        .find_patient_by_cpf(clinic_id, cpf)
        .map_err(log_failure("Failed to look up CPF"))?;
    match existing {
        Some(patient) if Some(patient.id) != current => {
            Err(ServiceError::Conflict(DUPLICATE_CPF.to_string()))
        }
        _ => Ok(()),
    }
}

pub fn create_patient<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: PatientForm,
) -> ServiceResult<Patient>
where
    R: PatientReader + PatientWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Patients, Action::Create)?;
    let details = PatientDetails::try_from(form)?;
    ensure_unique_cpf(repo, clinic_id, &details, None)?;

    let patient = repo
        .create_patient(&NewPatient::new(clinic_id, details))
        .map_err(log_failure("Failed to create patient"))?;
    Ok(patient)
}

pub fn update_patient<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    patient_id: i32,
    form: PatientForm,
) -> ServiceResult<Patient>
where
    R: PatientReader + PatientWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Patients, Action::Edit)?;
    let patient_id = PatientId::new(patient_id)?;
    let details = PatientDetails::try_from(form)?;
    ensure_unique_cpf(repo, clinic_id, &details, Some(patient_id))?;

    let patient = repo
        .update_patient(clinic_id, patient_id, &details)
        .map_err(log_failure("Failed to update patient"))?;
    Ok(patient)
}

/// Soft delete; the patient's history is kept.
pub fn deactivate_patient<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    patient_id: i32,
) -> ServiceResult<Patient>
where
    R: PatientWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Patients, Action::Delete)?;
    let patient = repo
        .set_patient_active(clinic_id, PatientId::new(patient_id)?, false)
        .map_err(log_failure("Failed to deactivate patient"))?;
    Ok(patient)
}

pub fn reactivate_patient<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    patient_id: i32,
) -> ServiceResult<Patient>
where
    R: PatientWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Patients, Action::Edit)?;
    let patient = repo
        .set_patient_active(clinic_id, PatientId::new(patient_id)?, true)
        .map_err(log_failure("Failed to reactivate patient"))?;
    Ok(patient)
}

/// Imports every row of `csv` or none of them.
pub fn import_patients<R, F>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    csv: F,
) -> ServiceResult<ImportOutcome>
where
    R: PatientReader + PatientWriter + MemberReader + PermissionReader + ?Sized,
    F: Read,
{
    ensure_permission(repo, user, clinic_id, Module::Patients, Action::Create)?;
    let rows = parse_patients_csv(csv)?;
    if rows.is_empty() {
        return Err(FormError::Csv("nenhum paciente encontrado".to_string()).into());
    }

    let mut seen = HashSet::new();
    for (index, details) in rows.iter().enumerate() {
        let Some(cpf) = &details.cpf else {
            continue;
        };
        if !seen.insert(cpf.as_str().to_string()) {
            return Err(ServiceError::Conflict(format!(
                "linha {}: CPF repetido no arquivo",
                index + 2
            )));
        }
        ensure_unique_cpf(repo, clinic_id, details, None)
            .map_err(|err| match err {
                ServiceError::Conflict(msg) => {
                    ServiceError::Conflict(format!("linha {}: {msg}", index + 2))
                }
                other => other,
            })?;
    }

    let patients: Vec<NewPatient> = rows
        .into_iter()
        .map(|details| NewPatient::new(clinic_id, details))
        .collect();
    let inserted = repo
        .create_patients(&patients)
        .map_err(log_failure("Failed to import patients"))?;
    log::info!("{} imported {inserted} patients into clinic {clinic_id}", user.email);
    Ok(ImportOutcome { inserted })
}

/// Patient with appointments, packages and, when the caller may read medical
/// records, evolutions.
pub fn patient_history<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    patient_id: i32,
    today: NaiveDate,
) -> ServiceResult<PatientHistory>
where
    R: PatientReader
        + AppointmentReader
        + MedicalReader
        + PackageReader
        + MemberReader
        + PermissionReader
        + ?Sized,
{
    let member = ensure_permission(repo, user, clinic_id, Module::Patients, Action::View)?;
    let patient = load_patient(repo, clinic_id, PatientId::new(patient_id)?)?;

    let appointments = repo
        .list_patient_appointments(clinic_id, patient.id)
        .map_err(log_failure("Failed to load patient appointments"))?;
    let packages = repo
        .list_packages(clinic_id, patient.id)
        .map_err(log_failure("Failed to load patient packages"))?
        .into_iter()
        .map(|package| PackageBalance::new(package, today))
        .collect();

    let permissions = effective_permissions(repo, clinic_id, member.role)?;
    let evolutions = if permissions.allows(Module::MedicalRecords, Action::View) {
        repo.list_evolutions(clinic_id, patient.id)
            .map_err(log_failure("Failed to load evolutions"))?
    } else {
        Vec::new()
    };

    Ok(PatientHistory {
        patient,
        appointments,
        evolutions,
        packages,
    })
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::domain::member::Role;
    use crate::domain::types::{Cpf, PersonName};
    use crate::services::access::test_support::*;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn patient(id: i32, cpf: Option<&str>) -> Patient {
        Patient {
            id: PatientId::new(id).unwrap(),
            clinic_id: clinic(),
            name: PersonName::new("Maria Souza").unwrap(),
            cpf: cpf.map(|c| Cpf::new(c).unwrap()),
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

    fn form(cpf: Option<&str>) -> PatientForm {
        PatientForm {
            name: "Maria Souza".into(),
            cpf: cpf.map(str::to_string),
            birth_date: None,
            phone: None,
            email: None,
            address: None,
            health_insurance: None,
            emergency_contact: None,
            notes: None,
        }
    }

    #[test]
    fn listing_is_paginated() {
        let mut repo = repo_as(Role::Receptionist);
        repo.expect_list_patients()
            .withf(|_, query| query.page == 2 && query.per_page == 1 && query.search.is_none())
            .returning(|_, _| Ok((3, vec![patient(2, None)])));

        let query = PatientsQuery {
            search: Some("  ".into()),
            include_inactive: false,
            page: Some(2),
        };
        let page = list_patients(&repo, &user(), clinic(), query, 1).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn duplicate_cpf_is_a_conflict() {
        let mut repo = repo_as(Role::Receptionist);
        repo.expect_find_patient_by_cpf()
            .returning(|_, _| Ok(Some(patient(4, Some("52998224725")))));
        repo.expect_create_patient().never();

        assert!(matches!(
            create_patient(&repo, &user(), clinic(), form(Some("529.982.247-25"))),
            Err(ServiceError::Conflict(msg)) if msg == DUPLICATE_CPF
        ));
    }

    #[test]
    fn patient_keeps_its_own_cpf_on_update() {
        let mut repo = repo_as(Role::Receptionist);
        repo.expect_find_patient_by_cpf()
            .returning(|_, _| Ok(Some(patient(4, Some("52998224725")))));
        repo.expect_update_patient()
            .returning(|_, id, _| Ok(patient(id.get(), Some("52998224725"))));

        let updated =
            update_patient(&repo, &user(), clinic(), 4, form(Some("52998224725"))).unwrap();
        assert_eq!(updated.id.get(), 4);
    }

    #[test]
    fn receptionist_cannot_deactivate() {
        let repo = repo_as(Role::Receptionist);
        assert!(matches!(
            deactivate_patient(&repo, &user(), clinic(), 4),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn import_inserts_all_rows() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_find_patient_by_cpf().returning(|_, _| Ok(None));
        repo.expect_create_patients()
            .withf(|patients| patients.len() == 2)
            .returning(|patients| Ok(patients.len()));

        let csv = "name,cpf,phone\nMaria,529.982.247-25,\nJoão,,11987654321\n";
        let outcome = import_patients(&repo, &user(), clinic(), csv.as_bytes()).unwrap();
        assert_eq!(outcome, ImportOutcome { inserted: 2 });
    }

    #[test]
    fn import_reports_the_failing_line() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_create_patients().never();

        let csv = "name,phone\nMaria,\n,11987654321\n";
        match import_patients(&repo, &user(), clinic(), csv.as_bytes()) {
            Err(ServiceError::Form(msg)) => assert!(msg.contains("linha 3")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn history_hides_evolutions_without_record_access() {
        let mut repo = repo_as(Role::Receptionist);
        repo.expect_get_patient()
            .returning(|_, id| Ok(Some(patient(id.get(), None))));
        repo.expect_list_patient_appointments()
            .returning(|_, _| Ok(vec![]));
        repo.expect_list_packages().returning(|_, _| Ok(vec![]));
        repo.expect_list_evolutions().never();

        let history = patient_history(
            &repo,
            &user(),
            clinic(),
            1,
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        )
        .unwrap();
        assert!(history.evolutions.is_empty());
        assert_eq!(history.patient.id.get(), 1);
    }
}
