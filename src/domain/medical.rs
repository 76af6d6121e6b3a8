//! Anamnesis record and clinical evolution notes.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    AppointmentId, ClinicId, ClinicalText, EvolutionId, MedicalRecordId, PainLevel, PatientId,
    ProfessionalId,
};

/// Sanitizes an optional free-text field, treating blank input as absent.
pub fn sanitize_optional(value: Option<String>) -> Option<ClinicalText> {
    value.and_then(|text| ClinicalText::new(text).ok())
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecordContent {
    pub chief_complaint: Option<ClinicalText>,
    pub history_present_illness: Option<ClinicalText>,
    pub past_medical_history: Option<ClinicalText>,
    pub medications: Option<ClinicalText>,
    pub allergies: Option<ClinicalText>,
    pub lifestyle: Option<ClinicalText>,
    pub physical_exam: Option<ClinicalText>,
    pub diagnosis: Option<ClinicalText>,
    pub treatment_plan: Option<ClinicalText>,
}

/// One record per patient.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub id: MedicalRecordId,
    pub clinic_id: ClinicId,
    pub patient_id: PatientId,
    #[serde(flatten)]
    pub content: MedicalRecordContent,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Evolution {
    pub id: EvolutionId,
    pub clinic_id: ClinicId,
    pub patient_id: PatientId,
    pub professional_id: Option<ProfessionalId>,
    pub appointment_id: Option<AppointmentId>,
    pub session_date: NaiveDate,
    pub description: ClinicalText,
    pub procedures: Option<ClinicalText>,
    pub pain_level: Option<PainLevel>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EvolutionDetails {
    pub professional_id: Option<ProfessionalId>,
    pub appointment_id: Option<AppointmentId>,
    pub session_date: NaiveDate,
    pub description: ClinicalText,
    pub procedures: Option<ClinicalText>,
    pub pain_level: Option<PainLevel>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewEvolution {
    pub clinic_id: ClinicId,
    pub patient_id: PatientId,
    pub details: EvolutionDetails,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_markup_only_text_is_dropped() {
        assert_eq!(sanitize_optional(None), None);
        assert_eq!(sanitize_optional(Some("   ".into())), None);
        assert_eq!(sanitize_optional(Some("<script>x</script>".into())), None);
        let kept = sanitize_optional(Some("Dor no joelho <b>direito</b>".into())).unwrap();
        assert!(kept.as_str().starts_with("Dor no joelho"));
    }
}
