//! Anamnesis records and evolution notes.

use crate::domain::medical::{
    Evolution, EvolutionDetails, MedicalRecord, MedicalRecordContent, NewEvolution,
};
use crate::domain::permission::{Action, Module};
use crate::domain::types::{ClinicId, EvolutionId, PatientId};
use crate::forms::medical::{EvolutionForm, MedicalRecordForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    AppointmentReader, MedicalReader, MedicalWriter, MemberReader, PatientReader,
    PermissionReader, ProfessionalReader,
};
use crate::services::access::ensure_permission;
use crate::services::patients::load_patient;
use crate::services::{ServiceError, ServiceResult, log_failure};

pub fn get_record<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    patient_id: i32,
) -> ServiceResult<Option<MedicalRecord>>
where
    R: MedicalReader + PatientReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::MedicalRecords, Action::View)?;
    let patient = load_patient(repo, clinic_id, PatientId::new(patient_id)?)?;
    let record = repo
        .get_medical_record(clinic_id, patient.id)
        .map_err(log_failure("Failed to load medical record"))?;
    Ok(record)
}

/// Creates the patient's record or replaces its content.
pub fn save_record<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    patient_id: i32,
    form: MedicalRecordForm,
) -> ServiceResult<MedicalRecord>
where
    R: MedicalWriter + PatientReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::MedicalRecords, Action::Edit)?;
    let patient = load_patient(repo, clinic_id, PatientId::new(patient_id)?)?;
    let content = MedicalRecordContent::from(form);
    let record = repo
        .save_medical_record(clinic_id, patient.id, &content)
        .map_err(log_failure("Failed to save medical record"))?;
    Ok(record)
}

pub fn list_evolutions<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    patient_id: i32,
) -> ServiceResult<Vec<Evolution>>
where
    R: MedicalReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::MedicalRecords, Action::View)?;
    let evolutions = repo
        .list_evolutions(clinic_id, PatientId::new(patient_id)?)
        .map_err(log_failure("Failed to list evolutions"))?;
    Ok(evolutions)
}

fn ensure_evolution_references<R>(
    repo: &R,
    clinic_id: ClinicId,
    patient_id: PatientId,
    details: &EvolutionDetails,
) -> ServiceResult<()>
where
    R: AppointmentReader + ProfessionalReader + ?Sized,
{
    if let Some(professional_id) = details.professional_id {
        repo.get_professional(clinic_id, professional_id)
            .map_err(log_failure("Failed to load professional"))?
            .ok_or_else(|| ServiceError::Form("Profissional inválido".to_string()))?;
    }
    if let Some(appointment_id) = details.appointment_id {
        let appointment = repo
            .get_appointment(clinic_id, appointment_id)
            .map_err(log_failure("Failed to load appointment"))?;
        if !appointment.is_some_and(|a| a.patient_id == patient_id) {
            return Err(ServiceError::Form(
                "O atendimento não pertence a este paciente".to_string(),
            ));
        }
    }
    Ok(())
}

pub fn create_evolution<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    patient_id: i32,
    form: EvolutionForm,
) -> ServiceResult<Evolution>
where
    R: MedicalWriter
        + PatientReader
        + AppointmentReader
        + ProfessionalReader
        + MemberReader
        + PermissionReader
        + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::MedicalRecords, Action::Create)?;
    let patient = load_patient(repo, clinic_id, PatientId::new(patient_id)?)?;
    let details = EvolutionDetails::try_from(form)?;
    ensure_evolution_references(repo, clinic_id, patient.id, &details)?;

    let evolution = repo
        .create_evolution(&NewEvolution {
            clinic_id,
            patient_id: patient.id,
            details,
        })
        .map_err(log_failure("Failed to create evolution"))?;
    Ok(evolution)
}

fn load_evolution<R>(repo: &R, clinic_id: ClinicId, evolution_id: i32) -> ServiceResult<Evolution>
where
    R: MedicalReader + ?Sized,
{
    repo.get_evolution(clinic_id, EvolutionId::new(evolution_id)?)
        .map_err(log_failure("Failed to load evolution"))?
        .ok_or(ServiceError::NotFound)
}

pub fn update_evolution<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    evolution_id: i32,
    form: EvolutionForm,
) -> ServiceResult<Evolution>
where
    R: MedicalReader
        + MedicalWriter
        + AppointmentReader
        + ProfessionalReader
        + MemberReader
        + PermissionReader
        + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::MedicalRecords, Action::Edit)?;
    let current = load_evolution(repo, clinic_id, evolution_id)?;
    let details = EvolutionDetails::try_from(form)?;
    ensure_evolution_references(repo, clinic_id, current.patient_id, &details)?;

    let evolution = repo
        .update_evolution(clinic_id, current.id, &details)
        .map_err(log_failure("Failed to update evolution"))?;
    Ok(evolution)
}

pub fn delete_evolution<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    evolution_id: i32,
) -> ServiceResult<()>
where
    R: MedicalWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::MedicalRecords, Action::Delete)?;
    repo.delete_evolution(clinic_id, EvolutionId::new(evolution_id)?)
        .map_err(log_failure("Failed to delete evolution"))?;
    Ok(())
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::domain::appointment::{Appointment, AppointmentKind, AppointmentStatus};
    use crate::domain::member::Role;
    use crate::domain::patient::Patient;
    use crate::domain::types::{AppointmentId, MedicalRecordId, PersonName, ProfessionalId};
    use crate::services::access::test_support::*;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
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

    fn appointment_of(patient_id: i32) -> Appointment {
        Appointment {
            id: AppointmentId::new(20).unwrap(),
            clinic_id: clinic(),
            patient_id: PatientId::new(patient_id).unwrap(),
            professional_id: ProfessionalId::new(2).unwrap(),
            room_id: None,
            package_id: None,
            starts_at: stamp(),
            ends_at: stamp() + chrono::Duration::minutes(50),
            kind: AppointmentKind::Session,
            status: AppointmentStatus::Completed,
            notes: None,
            recurrence_group: None,
            created_at: stamp(),
            updated_at: stamp(),
        }
    }

    fn evolution_form(appointment_id: Option<i32>) -> EvolutionForm {
        EvolutionForm {
            professional_id: None,
            appointment_id,
            session_date: stamp().date(),
            description: "Ganho de amplitude no ombro".into(),
            procedures: None,
            pain_level: Some(4),
        }
    }

    #[test]
    fn receptionist_cannot_read_records() {
        let repo = repo_as(Role::Receptionist);
        assert!(matches!(
            get_record(&repo, &user(), clinic(), 1),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn record_is_upserted_for_the_patient() {
        let mut repo = repo_as(Role::Physiotherapist);
        repo.expect_get_patient()
            .returning(|_, id| Ok(Some(patient(id))));
        repo.expect_save_medical_record()
            .withf(|_, patient_id, content| {
                patient_id.get() == 1 && content.diagnosis.is_some()
            })
            .returning(|clinic_id, patient_id, content| {
                Ok(MedicalRecord {
                    id: MedicalRecordId::new(1).unwrap(),
                    clinic_id,
                    patient_id,
                    content: content.clone(),
                    created_at: stamp(),
                    updated_at: stamp(),
                })
            });

        let form = MedicalRecordForm {
            diagnosis: Some("Tendinopatia do supraespinhal".into()),
            ..MedicalRecordForm::default()
        };
        let record = save_record(&repo, &user(), clinic(), 1, form).unwrap();
        assert_eq!(record.patient_id.get(), 1);
    }

    #[test]
    fn evolution_must_reference_own_appointment() {
        let mut repo = repo_as(Role::Physiotherapist);
        repo.expect_get_patient()
            .returning(|_, id| Ok(Some(patient(id))));
        repo.expect_get_appointment()
            .returning(|_, _| Ok(Some(appointment_of(2))));
        repo.expect_create_evolution().never();

        assert!(matches!(
            create_evolution(&repo, &user(), clinic(), 1, evolution_form(Some(20))),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn evolution_is_created() {
        let mut repo = repo_as(Role::Physiotherapist);
        repo.expect_get_patient()
            .returning(|_, id| Ok(Some(patient(id))));
        repo.expect_get_appointment()
            .returning(|_, _| Ok(Some(appointment_of(1))));
        repo.expect_create_evolution().returning(|new| {
            Ok(Evolution {
                id: EvolutionId::new(3).unwrap(),
                clinic_id: new.clinic_id,
                patient_id: new.patient_id,
                professional_id: new.details.professional_id,
                appointment_id: new.details.appointment_id,
                session_date: new.details.session_date,
                description: new.details.description.clone(),
                procedures: new.details.procedures.clone(),
                pain_level: new.details.pain_level,
                created_at: stamp(),
            })
        });

        let evolution =
            create_evolution(&repo, &user(), clinic(), 1, evolution_form(Some(20))).unwrap();
        assert_eq!(evolution.pain_level.map(|p| p.get()), Some(4));
    }
}
