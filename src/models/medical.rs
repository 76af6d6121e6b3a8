//! Diesel models for medical records and evolutions.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::medical::{
    Evolution as DomainEvolution, EvolutionDetails, MedicalRecord as DomainMedicalRecord,
    MedicalRecordContent, NewEvolution as DomainNewEvolution,
};
use crate::domain::types::{
    AppointmentId, ClinicId, ClinicalText, EvolutionId, MedicalRecordId, PainLevel, PatientId,
    ProfessionalId, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::medical_records)]
pub struct MedicalRecord {
    pub id: i32,
    pub clinic_id: i32,
    pub patient_id: i32,
    pub chief_complaint: Option<String>,
    pub history_present_illness: Option<String>,
    pub past_medical_history: Option<String>,
    pub medications: Option<String>,
    pub allergies: Option<String>,
    pub lifestyle: Option<String>,
    pub physical_exam: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment_plan: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Insertable)]
#[diesel(table_name = crate::schema::medical_records)]
#[diesel(treat_none_as_null = true)]
/// Anamnesis columns written by the record upsert.
pub struct MedicalRecordChanges<'a> {
    pub chief_complaint: Option<&'a str>,
    pub history_present_illness: Option<&'a str>,
    pub past_medical_history: Option<&'a str>,
    pub medications: Option<&'a str>,
    pub allergies: Option<&'a str>,
    pub lifestyle: Option<&'a str>,
    pub physical_exam: Option<&'a str>,
    pub diagnosis: Option<&'a str>,
    pub treatment_plan: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::medical_records)]
pub struct NewMedicalRecord<'a> {
    pub clinic_id: i32,
    pub patient_id: i32,
    #[diesel(embed)]
    pub changes: MedicalRecordChanges<'a>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::evolutions)]
pub struct Evolution {
    pub id: i32,
    pub clinic_id: i32,
    pub patient_id: i32,
    pub professional_id: Option<i32>,
    pub appointment_id: Option<i32>,
    pub session_date: NaiveDate,
    pub description: String,
    pub procedures: Option<String>,
    pub pain_level: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset, Insertable)]
#[diesel(table_name = crate::schema::evolutions)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateEvolution<'a> {
    pub professional_id: Option<i32>,
    pub appointment_id: Option<i32>,
    pub session_date: NaiveDate,
    pub description: &'a str,
    pub procedures: Option<&'a str>,
    pub pain_level: Option<i32>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::evolutions)]
pub struct NewEvolution<'a> {
    pub clinic_id: i32,
    pub patient_id: i32,
    #[diesel(embed)]
    pub details: UpdateEvolution<'a>,
    pub created_at: NaiveDateTime,
}

fn stored(text: Option<String>) -> Option<ClinicalText> {
    text.map(ClinicalText::from_stored)
}

fn text(value: &Option<ClinicalText>) -> Option<&str> {
    value.as_ref().map(ClinicalText::as_str)
}

impl TryFrom<MedicalRecord> for DomainMedicalRecord {
    type Error = TypeConstraintError;

    fn try_from(row: MedicalRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: MedicalRecordId::try_from(row.id)?,
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            patient_id: PatientId::try_from(row.patient_id)?,
            content: MedicalRecordContent {
                chief_complaint: stored(row.chief_complaint),
                history_present_illness: stored(row.history_present_illness),
                past_medical_history: stored(row.past_medical_history),
                medications: stored(row.medications),
                allergies: stored(row.allergies),
                lifestyle: stored(row.lifestyle),
                physical_exam: stored(row.physical_exam),
                diagnosis: stored(row.diagnosis),
                treatment_plan: stored(row.treatment_plan),
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> MedicalRecordChanges<'a> {
    pub fn from_domain(content: &'a MedicalRecordContent, now: NaiveDateTime) -> Self {
        Self {
            chief_complaint: text(&content.chief_complaint),
            history_present_illness: text(&content.history_present_illness),
            past_medical_history: text(&content.past_medical_history),
            medications: text(&content.medications),
            allergies: text(&content.allergies),
            lifestyle: text(&content.lifestyle),
            physical_exam: text(&content.physical_exam),
            diagnosis: text(&content.diagnosis),
            treatment_plan: text(&content.treatment_plan),
            updated_at: now,
        }
    }
}

impl TryFrom<Evolution> for DomainEvolution {
    type Error = TypeConstraintError;

    fn try_from(row: Evolution) -> Result<Self, Self::Error> {
        Ok(Self {
            id: EvolutionId::try_from(row.id)?,
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            patient_id: PatientId::try_from(row.patient_id)?,
            professional_id: row.professional_id.map(ProfessionalId::try_from).transpose()?,
            appointment_id: row.appointment_id.map(AppointmentId::try_from).transpose()?,
            session_date: row.session_date,
            description: ClinicalText::from_stored(row.description),
            procedures: stored(row.procedures),
            pain_level: row.pain_level.map(PainLevel::new).transpose()?,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a EvolutionDetails> for UpdateEvolution<'a> {
    fn from(d: &'a EvolutionDetails) -> Self {
        Self {
            professional_id: d.professional_id.map(ProfessionalId::get),
            appointment_id: d.appointment_id.map(AppointmentId::get),
            session_date: d.session_date,
            description: d.description.as_str(),
            procedures: text(&d.procedures),
            pain_level: d.pain_level.map(PainLevel::get),
        }
    }
}

impl<'a> NewEvolution<'a> {
    pub fn from_domain(evolution: &'a DomainNewEvolution, now: NaiveDateTime) -> Self {
        Self {
            clinic_id: evolution.clinic_id.get(),
            patient_id: evolution.patient_id.get(),
            details: (&evolution.details).into(),
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evolution_row_keeps_stored_text() {
        let now = chrono::Local::now().naive_local();
        let row = Evolution {
            id: 1,
            clinic_id: 1,
            patient_id: 2,
            professional_id: None,
            appointment_id: Some(7),
            session_date: now.date(),
            description: "Melhora da amplitude".into(),
            procedures: None,
            pain_level: Some(4),
            created_at: now,
        };
        let evolution = DomainEvolution::try_from(row).expect("valid evolution");
        assert_eq!(evolution.description.as_str(), "Melhora da amplitude");
        assert_eq!(evolution.pain_level.map(PainLevel::get), Some(4));
        assert_eq!(evolution.appointment_id.map(AppointmentId::get), Some(7));
    }

    #[test]
    fn record_changes_map_absent_fields_to_null() {
        let content = MedicalRecordContent {
            diagnosis: ClinicalText::new("Tendinite").ok(),
            ..Default::default()
        };
        let changes = MedicalRecordChanges::from_domain(&content, chrono::Local::now().naive_local());
        assert_eq!(changes.diagnosis, Some("Tendinite"));
        assert_eq!(changes.allergies, None);
    }
}
