use chrono::NaiveDateTime;

use crate::domain::lead::{Lead, LeadDetails, LeadStatus, NewLead};
use crate::domain::patient::{NewPatient, Patient};
use crate::domain::permission::{Action, Module};
use crate::domain::types::{ClinicId, LeadId};
use crate::forms::leads::{LeadForm, LeadStatusForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::errors::RepositoryError;
use crate::repository::{LeadReader, LeadWriter, MemberReader, PermissionReader};
use crate::services::access::{effective_permissions, ensure_permission};
use crate::services::{ServiceError, ServiceResult, log_failure};

const ALREADY_CONVERTED: &str = "Este lead já foi convertido em paciente";

pub fn list_leads<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    status: Option<LeadStatus>,
) -> ServiceResult<Vec<Lead>>
where
    R: LeadReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Leads, Action::View)?;
    let leads = repo
        .list_leads(clinic_id, status)
        .map_err(log_failure("Failed to list leads"))?;
    Ok(leads)
}

fn load_lead<R>(repo: &R, clinic_id: ClinicId, lead_id: i32) -> ServiceResult<Lead>
where
    R: LeadReader + ?Sized,
{
    repo.get_lead(clinic_id, LeadId::new(lead_id)?)
        .map_err(log_failure("Failed to load lead"))?
        .ok_or(ServiceError::NotFound)
}

pub fn get_lead<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    lead_id: i32,
) -> ServiceResult<Lead>
where
    R: LeadReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Leads, Action::View)?;
    load_lead(repo, clinic_id, lead_id)
}

pub fn create_lead<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: LeadForm,
) -> ServiceResult<Lead>
where
    R: LeadWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Leads, Action::Create)?;
    let details = LeadDetails::try_from(form)?;
    let lead = repo
        .create_lead(&NewLead::new(clinic_id, details))
        .map_err(log_failure("Failed to create lead"))?;
    Ok(lead)
}

pub fn update_lead<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    lead_id: i32,
    form: LeadForm,
) -> ServiceResult<Lead>
where
    R: LeadWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Leads, Action::Edit)?;
    let details = LeadDetails::try_from(form)?;
    let lead = repo
        .update_lead(clinic_id, LeadId::new(lead_id)?, &details)
        .map_err(log_failure("Failed to update lead"))?;
    Ok(lead)
}

/// Moves the lead through the funnel. `convertido` is reached only through
/// [`convert_to_patient`], and a converted lead keeps its status.
pub fn set_status<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    lead_id: i32,
    form: LeadStatusForm,
) -> ServiceResult<Lead>
where
    R: LeadReader + LeadWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Leads, Action::Edit)?;
    let lead = load_lead(repo, clinic_id, lead_id)?;
    if lead.is_converted() {
        return Err(ServiceError::Conflict(ALREADY_CONVERTED.to_string()));
    }
    if form.status == LeadStatus::Converted {
        return Err(ServiceError::Form(
            "Use a conversão para transformar o lead em paciente".to_string(),
        ));
    }

    let lead = repo
        .set_lead_status(clinic_id, lead.id, form.status)
        .map_err(log_failure("Failed to change lead status"))?;
    Ok(lead)
}

pub fn delete_lead<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    lead_id: i32,
) -> ServiceResult<()>
where
    R: LeadWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Leads, Action::Delete)?;
    repo.delete_lead(clinic_id, LeadId::new(lead_id)?)
        .map_err(log_failure("Failed to delete lead"))?;
    Ok(())
}

/// Creates a patient from the lead's contact data and marks the lead converted.
pub fn convert_to_patient<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    lead_id: i32,
) -> ServiceResult<(Lead, Patient)>
where
    R: LeadReader + LeadWriter + MemberReader + PermissionReader + ?Sized,
{
    let member = ensure_permission(repo, user, clinic_id, Module::Leads, Action::Edit)?;
    if !effective_permissions(repo, clinic_id, member.role)?
        .allows(Module::Patients, Action::Create)
    {
        return Err(ServiceError::Forbidden);
    }

    let lead = load_lead(repo, clinic_id, lead_id)?;
    if lead.is_converted() {
        return Err(ServiceError::Conflict(ALREADY_CONVERTED.to_string()));
    }

    let patient = NewPatient::new(clinic_id, lead.patient_details());
    let (lead, patient) = repo
        .convert_lead(clinic_id, lead.id, &patient)
        .map_err(|err| match err {
            RepositoryError::NotFound => {
                ServiceError::Conflict(ALREADY_CONVERTED.to_string())
            }
            err => log_failure("Failed to convert lead")(err).into(),
        })?;
    log::info!(
        "{} converted lead {} into patient {}",
        member.email,
        lead.id,
        patient.id
    );
    Ok((lead, patient))
}

/// Leads created in `[from, to)`.
pub(crate) fn count_new_leads<R>(
    repo: &R,
    clinic_id: ClinicId,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> ServiceResult<i64>
where
    R: LeadReader + ?Sized,
{
    let count = repo
        .count_leads_created_between(clinic_id, from, to)
        .map_err(log_failure("Failed to count leads"))?;
    Ok(count)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::member::Role;
    use crate::domain::types::{PatientId, PersonName};
    use crate::services::access::test_support::*;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn lead(status: LeadStatus, converted: Option<i32>) -> Lead {
        Lead {
            id: LeadId::new(3).unwrap(),
            clinic_id: clinic(),
            name: PersonName::new("João Lima").unwrap(),
            phone: None,
            email: None,
            source: Some("instagram".into()),
            status,
            notes: None,
            converted_patient_id: converted.map(|id| PatientId::new(id).unwrap()),
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    fn patient_from(new: &NewPatient) -> Patient {
        Patient {
            id: PatientId::new(40).unwrap(),
            clinic_id: new.clinic_id,
            name: new.details.name.clone(),
            cpf: None,
            birth_date: None,
            phone: new.details.phone.clone(),
            email: new.details.email.clone(),
            address: None,
            health_insurance: None,
            emergency_contact: None,
            notes: new.details.notes.clone(),
            is_active: true,
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    #[test]
    fn conversion_links_the_new_patient() {
        let mut repo = repo_as(Role::Receptionist);
        repo.expect_get_lead()
            .returning(|_, _| Ok(Some(lead(LeadStatus::Contacted, None))));
        repo.expect_convert_lead()
            .withf(|_, _, patient| patient.details.name.as_str() == "João Lima")
            .returning(|_, _, new| {
                let patient = patient_from(new);
                Ok((lead(LeadStatus::Converted, Some(patient.id.get())), patient))
            });

        let (lead, patient) = convert_to_patient(&repo, &user(), clinic(), 3).unwrap();
        assert_eq!(lead.status, LeadStatus::Converted);
        assert_eq!(lead.converted_patient_id, Some(patient.id));
    }

    #[test]
    fn converted_lead_cannot_convert_again() {
        let mut repo = repo_as(Role::Receptionist);
        repo.expect_get_lead()
            .returning(|_, _| Ok(Some(lead(LeadStatus::Converted, Some(40)))));
        repo.expect_convert_lead().never();

        assert!(matches!(
            convert_to_patient(&repo, &user(), clinic(), 3),
            Err(ServiceError::Conflict(msg)) if msg == ALREADY_CONVERTED
        ));
    }

    #[test]
    fn conversion_requires_patient_creation() {
        // Physiotherapists may view leads only.
        let repo = repo_as(Role::Physiotherapist);
        assert!(matches!(
            convert_to_patient(&repo, &user(), clinic(), 3),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn converted_status_is_not_set_by_hand() {
        let mut repo = repo_as(Role::Receptionist);
        repo.expect_get_lead()
            .returning(|_, _| Ok(Some(lead(LeadStatus::New, None))));
        repo.expect_set_lead_status().never();

        let form = LeadStatusForm {
            status: LeadStatus::Converted,
        };
        assert!(matches!(
            set_status(&repo, &user(), clinic(), 3, form),
            Err(ServiceError::Form(_))
        ));
    }
}
