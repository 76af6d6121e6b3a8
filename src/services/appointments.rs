//! Agenda operations: listings, booking, recurring series, status changes
//! with package credits, and free-slot lookup.

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::domain::appointment::{
    Appointment, AppointmentDetails, AppointmentFilter, AppointmentStatus, AppointmentView,
    DaySchedule, NewAppointment, available_slots as free_slots, ensure_duration, group_by_day,
    week_start,
};
use crate::domain::clinic::ClinicSettings;
use crate::domain::permission::{Action, Module};
use crate::domain::types::{AppointmentId, ClinicId, ProfessionalId, RoomId};
use crate::dto::agenda::{
    AppointmentsQuery, AvailableSlots, CancelledSeries, DayQuery, SeriesOutcome, SlotsQuery,
    WeekQuery,
};
use crate::forms::appointments::{
    AppointmentForm, CancelSeriesForm, RecurringForm, RecurringPayload, RescheduleForm, StatusForm,
};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    AppointmentReader, AppointmentWriter, ClinicReader, MemberReader, PackageReader,
    PatientReader, PermissionReader, ProfessionalReader,
};
use crate::services::{ServiceError, ServiceResult, access::ensure_permission, log_failure};

pub fn list_appointments<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    query: AppointmentsQuery,
) -> ServiceResult<Vec<AppointmentView>>
where
    R: AppointmentReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    let filter = AppointmentFilter::try_from(query)?;
    let appointments = repo
        .list_appointments(clinic_id, &filter)
        .map_err(log_failure("Failed to list appointments"))?;
    Ok(appointments)
}

fn schedule<R>(
    repo: &R,
    clinic_id: ClinicId,
    first_day: NaiveDate,
    days: u32,
    professional_id: Option<i32>,
) -> ServiceResult<Vec<DaySchedule>>
where
    R: AppointmentReader + ?Sized,
{
    let filter = AppointmentFilter {
        professional_id: professional_id.map(ProfessionalId::new).transpose()?,
        ..AppointmentFilter::for_days(first_day, days)?
    };
    let appointments = repo
        .list_appointments(clinic_id, &filter)
        .map_err(log_failure("Failed to load agenda"))?;
    Ok(group_by_day(first_day, days, appointments))
}

pub fn day_view<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    query: DayQuery,
) -> ServiceResult<DaySchedule>
where
    R: AppointmentReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    schedule(repo, clinic_id, query.date, 1, query.professional_id)?
        .pop()
        .ok_or_else(|| ServiceError::Internal("empty day schedule".to_string()))
}

/// Seven consecutive days starting at `query.start`, or at the Monday of `today`'s week.
pub fn week_view<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    query: WeekQuery,
    today: NaiveDate,
) -> ServiceResult<Vec<DaySchedule>>
where
    R: AppointmentReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    let first_day = match query.start {
        Some(start) => start,
        None => week_start(today)?,
    };
    schedule(repo, clinic_id, first_day, 7, query.professional_id)
}

pub(crate) fn load_appointment<R>(
    repo: &R,
    clinic_id: ClinicId,
    appointment_id: AppointmentId,
) -> ServiceResult<Appointment>
where
    R: AppointmentReader + ?Sized,
{
    repo.get_appointment(clinic_id, appointment_id)
        .map_err(log_failure("Failed to load appointment"))?
        .ok_or(ServiceError::NotFound)
}

pub fn get_appointment<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    appointment_id: i32,
) -> ServiceResult<Appointment>
where
    R: AppointmentReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    load_appointment(repo, clinic_id, AppointmentId::new(appointment_id)?)
}

fn invalid(message: &str) -> ServiceError {
    ServiceError::Form(message.to_string())
}

/// Every referenced row must exist in the clinic and be active; a package
/// must belong to the appointment's patient.
fn ensure_references<R>(
    repo: &R,
    clinic_id: ClinicId,
    details: &AppointmentDetails,
) -> ServiceResult<()>
where
    R: PatientReader + ProfessionalReader + PackageReader + ?Sized,
{
    let patient = repo
        .get_patient(clinic_id, details.patient_id)
        .map_err(log_failure("Failed to load patient"))?;
    if !patient.is_some_and(|p| p.is_active) {
        return Err(invalid("Paciente inválido ou inativo"));
    }

    let professional = repo
        .get_professional(clinic_id, details.professional_id)
        .map_err(log_failure("Failed to load professional"))?;
    if !professional.is_some_and(|p| p.is_active) {
        return Err(invalid("Profissional inválido ou inativo"));
    }

    if let Some(room_id) = details.room_id {
        let room = repo
            .get_room(clinic_id, room_id)
            .map_err(log_failure("Failed to load room"))?;
        if !room.is_some_and(|r| r.is_active) {
            return Err(invalid("Sala inválida ou inativa"));
        }
    }

    if let Some(package_id) = details.package_id {
        let package = repo
            .get_package(clinic_id, package_id)
            .map_err(log_failure("Failed to load package"))?;
        match package {
            Some(package) if package.patient_id != details.patient_id => {
                return Err(invalid("O pacote pertence a outro paciente"));
            }
            Some(package) if package.is_active => {}
            _ => return Err(invalid("Pacote inválido ou inativo")),
        }
    }
    Ok(())
}

pub fn create_appointment<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: AppointmentForm,
) -> ServiceResult<Appointment>
where
    R: AppointmentWriter
        + PatientReader
        + ProfessionalReader
        + PackageReader
        + MemberReader
        + PermissionReader
        + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::Create)?;
    let details = AppointmentDetails::try_from(form)?;
    ensure_references(repo, clinic_id, &details)?;

    let appointment = repo
        .create_appointment(&NewAppointment::scheduled(clinic_id, details))
        .map_err(log_failure("Failed to create appointment"))?;
    Ok(appointment)
}

/// Books every occurrence of the weekly rule under one fresh recurrence group.
pub fn create_recurring<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: RecurringForm,
) -> ServiceResult<SeriesOutcome>
where
    R: AppointmentWriter
        + PatientReader
        + ProfessionalReader
        + PackageReader
        + MemberReader
        + PermissionReader
        + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::Create)?;
    let RecurringPayload { template, rule } = RecurringPayload::try_from(form)?;
    ensure_references(repo, clinic_id, &template)?;

    let group = Uuid::new_v4().to_string();
    let series: Vec<NewAppointment> = rule
        .occurrences()
        .into_iter()
        .map(|(starts_at, ends_at)| NewAppointment {
            recurrence_group: Some(group.clone()),
            ..NewAppointment::scheduled(
                clinic_id,
                AppointmentDetails {
                    starts_at,
                    ends_at,
                    ..template.clone()
                },
            )
        })
        .collect();

    let appointments = repo
        .create_appointments(&series)
        .map_err(log_failure("Failed to create recurring appointments"))?;
    log::info!(
        "{} booked {} appointments in series {group}",
        user.email,
        appointments.len()
    );
    Ok(SeriesOutcome {
        recurrence_group: group,
        appointments,
    })
}

fn ensure_package_unchanged(current: &Appointment, details: &AppointmentDetails) -> ServiceResult<()> {
    if current.status == AppointmentStatus::Completed && current.package_id != details.package_id {
        return Err(ServiceError::Conflict(
            "Reabra o atendimento antes de trocar o pacote".to_string(),
        ));
    }
    Ok(())
}

pub fn update_appointment<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    appointment_id: i32,
    form: AppointmentForm,
) -> ServiceResult<Appointment>
where
    R: AppointmentReader
        + AppointmentWriter
        + PatientReader
        + ProfessionalReader
        + PackageReader
        + MemberReader
        + PermissionReader
        + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::Edit)?;
    let current = load_appointment(repo, clinic_id, AppointmentId::new(appointment_id)?)?;
    let details = AppointmentDetails::try_from(form)?;
    ensure_package_unchanged(&current, &details)?;
    ensure_references(repo, clinic_id, &details)?;

    let appointment = repo
        .update_appointment(clinic_id, current.id, &details)
        .map_err(log_failure("Failed to update appointment"))?;
    Ok(appointment)
}

/// Moves the appointment to a new start, keeping its duration, optionally
/// with another professional or room.
pub fn reschedule<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    appointment_id: i32,
    form: RescheduleForm,
) -> ServiceResult<Appointment>
where
    R: AppointmentReader
        + AppointmentWriter
        + PatientReader
        + ProfessionalReader
        + PackageReader
        + MemberReader
        + PermissionReader
        + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::Edit)?;
    let current = load_appointment(repo, clinic_id, AppointmentId::new(appointment_id)?)?;
    let (starts_at, ends_at) = current.shifted_to(form.starts_at)?;

    let mut details = AppointmentDetails {
        starts_at,
        ends_at,
        ..current.details()
    };
    if let Some(professional_id) = form.professional_id {
        details.professional_id = ProfessionalId::new(professional_id)?;
    }
    if let Some(room_id) = form.room_id {
        details.room_id = Some(RoomId::new(room_id)?);
    }
    ensure_references(repo, clinic_id, &details)?;

    let appointment = repo
        .update_appointment(clinic_id, current.id, &details)
        .map_err(log_failure("Failed to reschedule appointment"))?;
    Ok(appointment)
}

/// Changes the status. Entering `realizado` consumes a package credit and
/// leaving it returns the credit, atomically with the status change.
pub fn set_status<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    appointment_id: i32,
    form: StatusForm,
    today: NaiveDate,
) -> ServiceResult<Appointment>
where
    R: AppointmentReader + AppointmentWriter + PackageReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::Edit)?;
    let current = load_appointment(repo, clinic_id, AppointmentId::new(appointment_id)?)?;
    if current.status == form.status {
        return Ok(current);
    }

    let completing = form.status == AppointmentStatus::Completed;
    let reopening = current.status == AppointmentStatus::Completed;
    let credit_change = match current.package_id {
        Some(package_id) if completing => {
            let package = repo
                .get_package(clinic_id, package_id)
                .map_err(log_failure("Failed to load package"))?
                .ok_or(ServiceError::NotFound)?;
            if !package.can_consume(today) {
                return Err(ServiceError::Conflict(format!(
                    "Pacote {} está {}",
                    package.name,
                    package.status(today)
                )));
            }
            1
        }
        Some(_) if reopening => -1,
        _ => 0,
    };

    let appointment = repo
        .change_appointment_status(clinic_id, current.id, current.status, form.status, credit_change)
        .map_err(log_failure("Failed to change appointment status"))?;
    Ok(appointment)
}

/// Cancels the pending occurrences of a series from `form.from` (default `now`).
pub fn cancel_series<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    recurrence_group: &str,
    form: CancelSeriesForm,
    now: NaiveDateTime,
) -> ServiceResult<CancelledSeries>
where
    R: AppointmentWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::Edit)?;
    let group = recurrence_group.trim();
    if group.is_empty() {
        return Err(invalid("Série inválida"));
    }

    let cancelled = repo
        .cancel_series(clinic_id, group, form.from.unwrap_or(now))
        .map_err(log_failure("Failed to cancel series"))?;
    Ok(CancelledSeries {
        recurrence_group: group.to_string(),
        cancelled,
    })
}

/// Deletes the appointment, first returning the credit it consumed.
pub fn delete_appointment<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    appointment_id: i32,
) -> ServiceResult<()>
where
    R: AppointmentReader + AppointmentWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::Delete)?;
    let current = load_appointment(repo, clinic_id, AppointmentId::new(appointment_id)?)?;
    let return_credit =
        current.status == AppointmentStatus::Completed && current.package_id.is_some();

    repo.delete_appointment(clinic_id, current.id, return_credit)
        .map_err(log_failure("Failed to delete appointment"))?;
    Ok(())
}

/// Start times on `query.date` at which the professional is free.
pub fn available_slots<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    query: SlotsQuery,
) -> ServiceResult<AvailableSlots>
where
    R: AppointmentReader
        + ClinicReader
        + ProfessionalReader
        + MemberReader
        + PermissionReader
        + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;
    let professional_id = ProfessionalId::new(query.professional_id)?;
    repo.get_professional(clinic_id, professional_id)
        .map_err(log_failure("Failed to load professional"))?
        .ok_or(ServiceError::NotFound)?;

    let settings = repo
        .get_settings(clinic_id)
        .map_err(log_failure("Failed to load clinic settings"))?
        .unwrap_or_else(|| ClinicSettings::defaults(clinic_id));
    let duration_minutes = match query.duration_minutes {
        Some(minutes) => ensure_duration(minutes)?,
        None => settings.slot_minutes,
    };

    let day = AppointmentFilter::for_days(query.date, 1)?;
    let busy = repo
        .busy_intervals(clinic_id, professional_id, day.from, day.to)
        .map_err(log_failure("Failed to load busy intervals"))?;

    Ok(AvailableSlots {
        date: query.date,
        professional_id,
        duration_minutes,
        slots: free_slots(query.date, &settings, duration_minutes, &busy),
    })
}
