//! Appointments and the session packages whose credits they consume.

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::appointment::{
    Appointment, AppointmentDetails, AppointmentFilter, AppointmentStatus, AppointmentView,
    NewAppointment,
};
use crate::domain::finance::{NewReceivable, Receivable, ReceivableDetails};
use crate::domain::package::{NewSessionPackage, SessionPackage};
use crate::domain::types::{AppointmentId, ClinicId, PackageId, PatientId, ProfessionalId};
use crate::models::appointment::{
    Appointment as DbAppointment, NewAppointment as DbNewAppointment,
    NewSessionPackage as DbNewSessionPackage, SessionPackage as DbSessionPackage,
    UpdateAppointment as DbUpdateAppointment,
};
use crate::models::finance::{NewReceivable as DbNewReceivable, Receivable as DbReceivable};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    AppointmentReader, AppointmentWriter, DieselRepository, PackageReader, PackageWriter, now,
};
use crate::schema::{appointments, patients, professionals, receivables, rooms, session_packages};

type ViewRow = (DbAppointment, String, String, String, Option<String>);

fn into_view(row: ViewRow) -> RepositoryResult<AppointmentView> {
    let (row, patient_name, professional_name, color, room_name) = row;
    Ok(AppointmentView {
        appointment: Appointment::try_from(row)?,
        patient_name,
        professional_name,
        professional_color: color,
        room_name,
    })
}

/// Moves `change` credits on a package inside an open transaction. Consuming
/// never takes the package past its total.
fn move_credits(
    conn: &mut SqliteConnection,
    clinic_id: ClinicId,
    package_id: PackageId,
    change: i32,
) -> RepositoryResult<()> {
    let package = session_packages::table
        .filter(session_packages::clinic_id.eq(clinic_id.get()))
        .filter(session_packages::id.eq(package_id.get()));
    let used = session_packages::used_sessions.eq(session_packages::used_sessions + change);

    let updated = if change > 0 {
        diesel::update(package.filter(
            (session_packages::used_sessions + change).le(session_packages::total_sessions),
        ))
        .set(used)
        .execute(conn)?
    } else {
        diesel::update(package).set(used).execute(conn)?
    };

    if updated > 0 {
        return Ok(());
    }
    if package_exists(conn, clinic_id, package_id)? {
        return Err(RepositoryError::Conflict(
            "Pacote sem sessões disponíveis".to_string(),
        ));
    }
    Err(RepositoryError::NotFound)
}

fn package_exists(
    conn: &mut SqliteConnection,
    clinic_id: ClinicId,
    package_id: PackageId,
) -> RepositoryResult<bool> {
    let exists = diesel::select(diesel::dsl::exists(
        session_packages::table
            .filter(session_packages::clinic_id.eq(clinic_id.get()))
            .filter(session_packages::id.eq(package_id.get())),
    ))
    .get_result::<bool>(conn)?;
    Ok(exists)
}

fn appointment_exists(
    conn: &mut SqliteConnection,
    clinic_id: ClinicId,
    id: AppointmentId,
) -> RepositoryResult<bool> {
    let exists = diesel::select(diesel::dsl::exists(
        appointments::table
            .filter(appointments::clinic_id.eq(clinic_id.get()))
            .filter(appointments::id.eq(id.get())),
    ))
    .get_result::<bool>(conn)?;
    Ok(exists)
}

impl AppointmentReader for DieselRepository {
    fn get_appointment(
        &self,
        clinic_id: ClinicId,
        id: AppointmentId,
    ) -> RepositoryResult<Option<Appointment>> {
        let mut conn = self.conn()?;
        let appointment = appointments::table
            .filter(appointments::clinic_id.eq(clinic_id.get()))
            .filter(appointments::id.eq(id.get()))
            .first::<DbAppointment>(&mut conn)
            .optional()?;

        Ok(appointment.map(Appointment::try_from).transpose()?)
    }

    fn list_appointments(
        &self,
        clinic_id: ClinicId,
        filter: &AppointmentFilter,
    ) -> RepositoryResult<Vec<AppointmentView>> {
        let mut conn = self.conn()?;
        let mut query = appointments::table
            .inner_join(patients::table)
            .inner_join(professionals::table)
            .left_join(rooms::table)
            .filter(appointments::clinic_id.eq(clinic_id.get()))
            .filter(appointments::starts_at.lt(filter.to))
            .filter(appointments::ends_at.gt(filter.from))
            .select((
                DbAppointment::as_select(),
                patients::name,
                professionals::name,
                professionals::color,
                rooms::name.nullable(),
            ))
            .into_boxed();

        if let Some(professional_id) = filter.professional_id {
            query = query.filter(appointments::professional_id.eq(professional_id.get()));
        }
        if let Some(room_id) = filter.room_id {
            query = query.filter(appointments::room_id.eq(room_id.get()));
        }
        if let Some(patient_id) = filter.patient_id {
            query = query.filter(appointments::patient_id.eq(patient_id.get()));
        }
        if let Some(status) = filter.status {
            query = query.filter(appointments::status.eq(status.as_str()));
        }

        let rows = query
            .order((appointments::starts_at.asc(), appointments::id.asc()))
            .load::<ViewRow>(&mut conn)?;

        rows.into_iter().map(into_view).collect()
    }

    fn list_patient_appointments(
        &self,
        clinic_id: ClinicId,
        patient_id: PatientId,
    ) -> RepositoryResult<Vec<AppointmentView>> {
        let mut conn = self.conn()?;
        let rows = appointments::table
            .inner_join(patients::table)
            .inner_join(professionals::table)
            .left_join(rooms::table)
            .filter(appointments::clinic_id.eq(clinic_id.get()))
            .filter(appointments::patient_id.eq(patient_id.get()))
            .select((
                DbAppointment::as_select(),
                patients::name,
                professionals::name,
                professionals::color,
                rooms::name.nullable(),
            ))
            .order(appointments::starts_at.desc())
            .load::<ViewRow>(&mut conn)?;

        rows.into_iter().map(into_view).collect()
    }

    fn busy_intervals(
        &self,
        clinic_id: ClinicId,
        professional_id: ProfessionalId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<Vec<(NaiveDateTime, NaiveDateTime)>> {
        let mut conn = self.conn()?;
        let intervals = appointments::table
            .filter(appointments::clinic_id.eq(clinic_id.get()))
            .filter(appointments::professional_id.eq(professional_id.get()))
            .filter(appointments::status.ne(AppointmentStatus::Cancelled.as_str()))
            .filter(appointments::starts_at.lt(to))
            .filter(appointments::ends_at.gt(from))
            .select((appointments::starts_at, appointments::ends_at))
            .order(appointments::starts_at.asc())
            .load::<(NaiveDateTime, NaiveDateTime)>(&mut conn)?;

        Ok(intervals)
    }
}

impl AppointmentWriter for DieselRepository {
    fn create_appointment(&self, appointment: &NewAppointment) -> RepositoryResult<Appointment> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(appointments::table)
            .values(&DbNewAppointment::from_domain(appointment, now()))
            .get_result::<DbAppointment>(&mut conn)?;

        Ok(Appointment::try_from(created)?)
    }

    fn create_appointments(
        &self,
        new_appointments: &[NewAppointment],
    ) -> RepositoryResult<Vec<Appointment>> {
        let mut conn = self.conn()?;
        let created_at = now();

        conn.transaction::<_, RepositoryError, _>(|conn| {
            new_appointments
                .iter()
                .map(|appointment| -> RepositoryResult<Appointment> {
                    let row = diesel::insert_into(appointments::table)
                        .values(&DbNewAppointment::from_domain(appointment, created_at))
                        .get_result::<DbAppointment>(conn)?;
                    Ok(Appointment::try_from(row)?)
                })
                .collect()
        })
    }

    fn update_appointment(
        &self,
        clinic_id: ClinicId,
        id: AppointmentId,
        details: &AppointmentDetails,
    ) -> RepositoryResult<Appointment> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            appointments::table
                .filter(appointments::clinic_id.eq(clinic_id.get()))
                .filter(appointments::id.eq(id.get())),
        )
        .set(&DbUpdateAppointment::from_domain(details, now()))
        .get_result::<DbAppointment>(&mut conn)?;

        Ok(Appointment::try_from(updated)?)
    }

    fn change_appointment_status(
        &self,
        clinic_id: ClinicId,
        id: AppointmentId,
        from: AppointmentStatus,
        to: AppointmentStatus,
        credit_change: i32,
    ) -> RepositoryResult<Appointment> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, RepositoryError, _>(|conn| {
            let updated = diesel::update(
                appointments::table
                    .filter(appointments::clinic_id.eq(clinic_id.get()))
                    .filter(appointments::id.eq(id.get()))
                    .filter(appointments::status.eq(from.as_str())),
            )
            .set((
                appointments::status.eq(to.as_str()),
                appointments::updated_at.eq(now()),
            ))
            .get_result::<DbAppointment>(conn)
            .optional()?;

            let Some(updated) = updated else {
                if appointment_exists(conn, clinic_id, id)? {
                    return Err(RepositoryError::Conflict(
                        "O status do agendamento foi alterado por outra operação".to_string(),
                    ));
                }
                return Err(RepositoryError::NotFound);
            };

            let appointment = Appointment::try_from(updated)?;
            if credit_change != 0 {
                if let Some(package_id) = appointment.package_id {
                    move_credits(conn, clinic_id, package_id, credit_change)?;
                }
            }
            Ok(appointment)
        })
    }

    fn cancel_series(
        &self,
        clinic_id: ClinicId,
        recurrence_group: &str,
        from: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;
        let cancelled = diesel::update(
            appointments::table
                .filter(appointments::clinic_id.eq(clinic_id.get()))
                .filter(appointments::recurrence_group.eq(recurrence_group))
                .filter(appointments::starts_at.ge(from))
                .filter(appointments::status.eq_any([
                    AppointmentStatus::Scheduled.as_str(),
                    AppointmentStatus::Confirmed.as_str(),
                ])),
        )
        .set((
            appointments::status.eq(AppointmentStatus::Cancelled.as_str()),
            appointments::updated_at.eq(now()),
        ))
        .execute(&mut conn)?;

        Ok(cancelled)
    }

    fn delete_appointment(
        &self,
        clinic_id: ClinicId,
        id: AppointmentId,
        return_credit: bool,
    ) -> RepositoryResult<()> {
        let mut conn = self.conn()?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let package_id = appointments::table
                .filter(appointments::clinic_id.eq(clinic_id.get()))
                .filter(appointments::id.eq(id.get()))
                .select(appointments::package_id)
                .first::<Option<i32>>(conn)?;

            diesel::delete(
                appointments::table
                    .filter(appointments::clinic_id.eq(clinic_id.get()))
                    .filter(appointments::id.eq(id.get())),
            )
            .execute(conn)?;

            if return_credit {
                if let Some(package_id) = package_id {
                    move_credits(conn, clinic_id, PackageId::try_from(package_id)?, -1)?;
                }
            }
            Ok(())
        })
    }
}

impl PackageReader for DieselRepository {
    fn get_package(
        &self,
        clinic_id: ClinicId,
        id: PackageId,
    ) -> RepositoryResult<Option<SessionPackage>> {
        let mut conn = self.conn()?;
        let package = session_packages::table
            .filter(session_packages::clinic_id.eq(clinic_id.get()))
            .filter(session_packages::id.eq(id.get()))
            .first::<DbSessionPackage>(&mut conn)
            .optional()?;

        Ok(package.map(SessionPackage::try_from).transpose()?)
    }

    fn list_packages(
        &self,
        clinic_id: ClinicId,
        patient_id: PatientId,
    ) -> RepositoryResult<Vec<SessionPackage>> {
        let mut conn = self.conn()?;
        let rows = session_packages::table
            .filter(session_packages::clinic_id.eq(clinic_id.get()))
            .filter(session_packages::patient_id.eq(patient_id.get()))
            .order((
                session_packages::purchased_at.desc(),
                session_packages::id.desc(),
            ))
            .load::<DbSessionPackage>(&mut conn)?;

        rows.into_iter()
            .map(|row| SessionPackage::try_from(row).map_err(RepositoryError::from))
            .collect()
    }
}

impl PackageWriter for DieselRepository {
    fn create_package(
        &self,
        package: &NewSessionPackage,
        receivable: Option<&ReceivableDetails>,
    ) -> RepositoryResult<(SessionPackage, Option<Receivable>)> {
        let mut conn = self.conn()?;
        let created_at = now();

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let row = diesel::insert_into(session_packages::table)
                .values(&DbNewSessionPackage::from_domain(package, created_at))
                .get_result::<DbSessionPackage>(conn)?;
            let package = SessionPackage::try_from(row)?;

            let receivable = match receivable {
                Some(details) => {
                    let new_receivable = NewReceivable {
                        clinic_id: package.clinic_id,
                        package_id: Some(package.id),
                        details: details.clone(),
                    };
                    let row = diesel::insert_into(receivables::table)
                        .values(&DbNewReceivable::from_domain(&new_receivable, created_at))
                        .get_result::<DbReceivable>(conn)?;
                    Some(Receivable::try_from(row)?)
                }
                None => None,
            };

            Ok((package, receivable))
        })
    }

    fn set_package_active(
        &self,
        clinic_id: ClinicId,
        id: PackageId,
        is_active: bool,
    ) -> RepositoryResult<SessionPackage> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            session_packages::table
                .filter(session_packages::clinic_id.eq(clinic_id.get()))
                .filter(session_packages::id.eq(id.get())),
        )
        .set(session_packages::is_active.eq(is_active))
        .get_result::<DbSessionPackage>(&mut conn)?;

        Ok(SessionPackage::try_from(updated)?)
    }
}
