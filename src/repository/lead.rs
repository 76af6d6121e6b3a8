use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::lead::{Lead, LeadDetails, LeadStatus, NewLead};
use crate::domain::patient::{NewPatient, Patient};
use crate::domain::types::{ClinicId, LeadId};
use crate::models::lead::{Lead as DbLead, NewLead as DbNewLead, UpdateLead};
use crate::models::patient::{NewPatient as DbNewPatient, Patient as DbPatient};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, LeadReader, LeadWriter, now};
use crate::schema::{leads, patients};

impl LeadReader for DieselRepository {
    fn get_lead(&self, clinic_id: ClinicId, id: LeadId) -> RepositoryResult<Option<Lead>> {
        let mut conn = self.conn()?;
        let lead = leads::table
            .filter(leads::clinic_id.eq(clinic_id.get()))
            .filter(leads::id.eq(id.get()))
            .first::<DbLead>(&mut conn)
            .optional()?;

        Ok(lead.map(Lead::try_from).transpose()?)
    }

    fn list_leads(
        &self,
        clinic_id: ClinicId,
        status: Option<LeadStatus>,
    ) -> RepositoryResult<Vec<Lead>> {
        let mut conn = self.conn()?;
        let mut query = leads::table
            .filter(leads::clinic_id.eq(clinic_id.get()))
            .into_boxed();
        if let Some(status) = status {
            query = query.filter(leads::status.eq(status.as_str()));
        }
        let rows = query
            .order((leads::created_at.desc(), leads::id.desc()))
            .load::<DbLead>(&mut conn)?;

        rows.into_iter()
            .map(|row| Lead::try_from(row).map_err(RepositoryError::from))
            .collect()
    }

    fn count_leads_created_between(
        &self,
        clinic_id: ClinicId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let mut conn = self.conn()?;
        let count = leads::table
            .filter(leads::clinic_id.eq(clinic_id.get()))
            .filter(leads::created_at.ge(from))
            .filter(leads::created_at.lt(to))
            .count()
            .get_result(&mut conn)?;

        Ok(count)
    }
}

impl LeadWriter for DieselRepository {
    fn create_lead(&self, lead: &NewLead) -> RepositoryResult<Lead> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(leads::table)
            .values(&DbNewLead::from_domain(lead, now()))
            .get_result::<DbLead>(&mut conn)?;

        Ok(Lead::try_from(created)?)
    }

    fn update_lead(
        &self,
        clinic_id: ClinicId,
        id: LeadId,
        details: &LeadDetails,
    ) -> RepositoryResult<Lead> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            leads::table
                .filter(leads::clinic_id.eq(clinic_id.get()))
                .filter(leads::id.eq(id.get())),
        )
        .set(&UpdateLead::from_domain(details, now()))
        .get_result::<DbLead>(&mut conn)?;

        Ok(Lead::try_from(updated)?)
    }

    fn set_lead_status(
        &self,
        clinic_id: ClinicId,
        id: LeadId,
        status: LeadStatus,
    ) -> RepositoryResult<Lead> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            leads::table
                .filter(leads::clinic_id.eq(clinic_id.get()))
                .filter(leads::id.eq(id.get())),
        )
        .set((leads::status.eq(status.as_str()), leads::updated_at.eq(now())))
        .get_result::<DbLead>(&mut conn)?;

        Ok(Lead::try_from(updated)?)
    }

    fn delete_lead(&self, clinic_id: ClinicId, id: LeadId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            leads::table
                .filter(leads::clinic_id.eq(clinic_id.get()))
                .filter(leads::id.eq(id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn convert_lead(
        &self,
        clinic_id: ClinicId,
        id: LeadId,
        patient: &NewPatient,
    ) -> RepositoryResult<(Lead, Patient)> {
        let mut conn = self.conn()?;
        let timestamp = now();

        conn.transaction::<_, RepositoryError, _>(|conn| {
            let created = diesel::insert_into(patients::table)
                .values(&DbNewPatient::from_domain(patient, timestamp))
                .get_result::<DbPatient>(conn)?;

            let lead = diesel::update(
                leads::table
                    .filter(leads::clinic_id.eq(clinic_id.get()))
                    .filter(leads::id.eq(id.get()))
                    .filter(leads::converted_patient_id.is_null()),
            )
            .set((
                leads::status.eq(LeadStatus::Converted.as_str()),
                leads::converted_patient_id.eq(Some(created.id)),
                leads::updated_at.eq(timestamp),
            ))
            .get_result::<DbLead>(conn)?;

            Ok((Lead::try_from(lead)?, Patient::try_from(created)?))
        })
    }
}
