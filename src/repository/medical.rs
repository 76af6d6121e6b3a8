use diesel::prelude::*;

use crate::domain::medical::{
    Evolution, EvolutionDetails, MedicalRecord, MedicalRecordContent, NewEvolution,
};
use crate::domain::types::{ClinicId, EvolutionId, PatientId};
use crate::models::medical::{
    Evolution as DbEvolution, MedicalRecord as DbMedicalRecord, MedicalRecordChanges,
    NewEvolution as DbNewEvolution, NewMedicalRecord, UpdateEvolution,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, MedicalReader, MedicalWriter, now};
use crate::schema::{evolutions, medical_records};

impl MedicalReader for DieselRepository {
    fn get_medical_record(
        &self,
        clinic_id: ClinicId,
        patient_id: PatientId,
    ) -> RepositoryResult<Option<MedicalRecord>> {
        let mut conn = self.conn()?;
        let record = medical_records::table
            .filter(medical_records::clinic_id.eq(clinic_id.get()))
            .filter(medical_records::patient_id.eq(patient_id.get()))
            .first::<DbMedicalRecord>(&mut conn)
            .optional()?;

        Ok(record.map(MedicalRecord::try_from).transpose()?)
    }

    fn get_evolution(
        &self,
        clinic_id: ClinicId,
        id: EvolutionId,
    ) -> RepositoryResult<Option<Evolution>> {
        let mut conn = self.conn()?;
        let evolution = evolutions::table
            .filter(evolutions::clinic_id.eq(clinic_id.get()))
            .filter(evolutions::id.eq(id.get()))
            .first::<DbEvolution>(&mut conn)
            .optional()?;

        Ok(evolution.map(Evolution::try_from).transpose()?)
    }

    fn list_evolutions(
        &self,
        clinic_id: ClinicId,
        patient_id: PatientId,
    ) -> RepositoryResult<Vec<Evolution>> {
        let mut conn = self.conn()?;
        let rows = evolutions::table
            .filter(evolutions::clinic_id.eq(clinic_id.get()))
            .filter(evolutions::patient_id.eq(patient_id.get()))
            .order((evolutions::session_date.desc(), evolutions::id.desc()))
            .load::<DbEvolution>(&mut conn)?;

        rows.into_iter()
            .map(|row| Evolution::try_from(row).map_err(RepositoryError::from))
            .collect()
    }
}

impl MedicalWriter for DieselRepository {
    fn save_medical_record(
        &self,
        clinic_id: ClinicId,
        patient_id: PatientId,
        content: &MedicalRecordContent,
    ) -> RepositoryResult<MedicalRecord> {
        let mut conn = self.conn()?;
        let timestamp = now();
        let record = NewMedicalRecord {
            clinic_id: clinic_id.get(),
            patient_id: patient_id.get(),
            changes: MedicalRecordChanges::from_domain(content, timestamp),
            created_at: timestamp,
        };

        // One record per patient: a second save rewrites the anamnesis.
        let saved = diesel::insert_into(medical_records::table)
            .values(&record)
            .on_conflict(medical_records::patient_id)
            .do_update()
            .set(&MedicalRecordChanges::from_domain(content, timestamp))
            .get_result::<DbMedicalRecord>(&mut conn)?;

        Ok(MedicalRecord::try_from(saved)?)
    }

    fn create_evolution(&self, evolution: &NewEvolution) -> RepositoryResult<Evolution> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(evolutions::table)
            .values(&DbNewEvolution::from_domain(evolution, now()))
            .get_result::<DbEvolution>(&mut conn)?;

        Ok(Evolution::try_from(created)?)
    }

    fn update_evolution(
        &self,
        clinic_id: ClinicId,
        id: EvolutionId,
        details: &EvolutionDetails,
    ) -> RepositoryResult<Evolution> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            evolutions::table
                .filter(evolutions::clinic_id.eq(clinic_id.get()))
                .filter(evolutions::id.eq(id.get())),
        )
        .set(&UpdateEvolution::from(details))
        .get_result::<DbEvolution>(&mut conn)?;

        Ok(Evolution::try_from(updated)?)
    }

    fn delete_evolution(&self, clinic_id: ClinicId, id: EvolutionId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            evolutions::table
                .filter(evolutions::clinic_id.eq(clinic_id.get()))
                .filter(evolutions::id.eq(id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
