use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::patient::{NewPatient, Patient, PatientDetails, PatientListQuery};
use crate::domain::types::{ClinicId, Cpf, PatientId};
use crate::models::patient::{
    NewPatient as DbNewPatient, Patient as DbPatient, UpdatePatient as DbUpdatePatient,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, PatientReader, PatientWriter, now};
use crate::schema::patients;

/// Filtered patient query shared by the page query and its count.
fn filtered<'a>(
    clinic_id: ClinicId,
    query: &PatientListQuery,
) -> patients::BoxedQuery<'a, Sqlite> {
    let mut items = patients::table
        .filter(patients::clinic_id.eq(clinic_id.get()))
        .into_boxed();

    if !query.include_inactive {
        items = items.filter(patients::is_active.eq(true));
    }

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        let digits: String = search.chars().filter(char::is_ascii_digit).collect();
        let digit_pattern = if digits.is_empty() {
            pattern.clone()
        } else {
            format!("%{digits}%")
        };
        items = items.filter(
            patients::name
                .like(pattern.clone())
                .or(patients::email.like(pattern))
                .or(patients::cpf.like(digit_pattern.clone()))
                .or(patients::phone.like(digit_pattern)),
        );
    }

    items
}

fn into_patients(rows: Vec<DbPatient>) -> RepositoryResult<Vec<Patient>> {
    rows.into_iter()
        .map(|row| Patient::try_from(row).map_err(RepositoryError::from))
        .collect()
}

impl PatientReader for DieselRepository {
    fn get_patient(&self, clinic_id: ClinicId, id: PatientId) -> RepositoryResult<Option<Patient>> {
        let mut conn = self.conn()?;
        let patient = patients::table
            .filter(patients::clinic_id.eq(clinic_id.get()))
            .filter(patients::id.eq(id.get()))
            .first::<DbPatient>(&mut conn)
            .optional()?;

        Ok(patient.map(Patient::try_from).transpose()?)
    }

    fn list_patients(
        &self,
        clinic_id: ClinicId,
        query: &PatientListQuery,
    ) -> RepositoryResult<(usize, Vec<Patient>)> {
        let mut conn = self.conn()?;

        let total: i64 = filtered(clinic_id, query).count().get_result(&mut conn)?;

        let mut items = filtered(clinic_id, query).order(patients::name.asc());
        if query.per_page > 0 {
            let page = query.page.max(1);
            items = items
                .offset(((page - 1) * query.per_page) as i64)
                .limit(query.per_page as i64);
        }
        let rows = items.load::<DbPatient>(&mut conn)?;

        Ok((total as usize, into_patients(rows)?))
    }

    fn find_patient_by_cpf(
        &self,
        clinic_id: ClinicId,
        cpf: &Cpf,
    ) -> RepositoryResult<Option<Patient>> {
        let mut conn = self.conn()?;
        let patient = patients::table
            .filter(patients::clinic_id.eq(clinic_id.get()))
            .filter(patients::cpf.eq(cpf.as_str()))
            .first::<DbPatient>(&mut conn)
            .optional()?;

        Ok(patient.map(Patient::try_from).transpose()?)
    }

    fn count_active_patients(&self, clinic_id: ClinicId) -> RepositoryResult<i64> {
        let mut conn = self.conn()?;
        let count = patients::table
            .filter(patients::clinic_id.eq(clinic_id.get()))
            .filter(patients::is_active.eq(true))
            .count()
            .get_result(&mut conn)?;

        Ok(count)
    }
}

impl PatientWriter for DieselRepository {
    fn create_patient(&self, patient: &NewPatient) -> RepositoryResult<Patient> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(patients::table)
            .values(&DbNewPatient::from_domain(patient, now()))
            .get_result::<DbPatient>(&mut conn)?;

        Ok(Patient::try_from(created)?)
    }

    fn create_patients(&self, patients_to_add: &[NewPatient]) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;
        let created_at = now();
        let rows: Vec<DbNewPatient> = patients_to_add
            .iter()
            .map(|p| DbNewPatient::from_domain(p, created_at))
            .collect();

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let mut inserted = 0;
            for row in &rows {
                inserted += diesel::insert_into(patients::table)
                    .values(row)
                    .execute(conn)?;
            }
            Ok(inserted)
        })
    }

    fn update_patient(
        &self,
        clinic_id: ClinicId,
        id: PatientId,
        details: &PatientDetails,
    ) -> RepositoryResult<Patient> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            patients::table
                .filter(patients::clinic_id.eq(clinic_id.get()))
                .filter(patients::id.eq(id.get())),
        )
        .set(&DbUpdatePatient::from_domain(details, now()))
        .get_result::<DbPatient>(&mut conn)?;

        Ok(Patient::try_from(updated)?)
    }

    fn set_patient_active(
        &self,
        clinic_id: ClinicId,
        id: PatientId,
        is_active: bool,
    ) -> RepositoryResult<Patient> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            patients::table
                .filter(patients::clinic_id.eq(clinic_id.get()))
                .filter(patients::id.eq(id.get())),
        )
        .set((
            patients::is_active.eq(is_active),
            patients::updated_at.eq(now()),
        ))
        .get_result::<DbPatient>(&mut conn)?;

        Ok(Patient::try_from(updated)?)
    }
}
