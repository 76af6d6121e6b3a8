use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::medical::{EvolutionDetails, MedicalRecordContent, sanitize_optional};
use crate::domain::types::{AppointmentId, ClinicalText, PainLevel, ProfessionalId};
use crate::forms::FormError;

/// Anamnesis fields; every field is optional free text.
#[derive(Deserialize, Default)]
pub struct MedicalRecordForm {
    pub chief_complaint: Option<String>,
    pub history_present_illness: Option<String>,
    pub past_medical_history: Option<String>,
    pub medications: Option<String>,
    pub allergies: Option<String>,
    pub lifestyle: Option<String>,
    pub physical_exam: Option<String>,
    pub diagnosis: Option<String>,
    pub treatment_plan: Option<String>,
}

impl From<MedicalRecordForm> for MedicalRecordContent {
    fn from(form: MedicalRecordForm) -> Self {
        MedicalRecordContent {
            chief_complaint: sanitize_optional(form.chief_complaint),
            history_present_illness: sanitize_optional(form.history_present_illness),
            past_medical_history: sanitize_optional(form.past_medical_history),
            medications: sanitize_optional(form.medications),
            allergies: sanitize_optional(form.allergies),
            lifestyle: sanitize_optional(form.lifestyle),
            physical_exam: sanitize_optional(form.physical_exam),
            diagnosis: sanitize_optional(form.diagnosis),
            treatment_plan: sanitize_optional(form.treatment_plan),
        }
    }
}

#[derive(Deserialize)]
pub struct EvolutionForm {
    pub professional_id: Option<i32>,
    pub appointment_id: Option<i32>,
    pub session_date: NaiveDate,
    pub description: String,
    pub procedures: Option<String>,
    /// 0 to 10.
    pub pain_level: Option<i32>,
}

impl TryFrom<EvolutionForm> for EvolutionDetails {
    type Error = FormError;

    fn try_from(form: EvolutionForm) -> Result<Self, Self::Error> {
        Ok(EvolutionDetails {
            professional_id: form.professional_id.map(ProfessionalId::new).transpose()?,
            appointment_id: form.appointment_id.map(AppointmentId::new).transpose()?,
            session_date: form.session_date,
            description: ClinicalText::new(form.description)
                .map_err(|_| FormError::InvalidField("descrição obrigatória".to_string()))?,
            procedures: sanitize_optional(form.procedures),
            pain_level: form.pain_level.map(PainLevel::new).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(description: &str, pain_level: Option<i32>) -> EvolutionForm {
        EvolutionForm {
            professional_id: Some(1),
            appointment_id: None,
            session_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            description: description.into(),
            procedures: Some("<b>TENS</b> 20min".into()),
            pain_level,
        }
    }

    #[test]
    fn evolution_text_is_sanitized() {
        let details = EvolutionDetails::try_from(form("Melhora <script>x()</script>da dor", Some(3)))
            .unwrap();
        assert!(!details.description.as_str().contains("script"));
        assert_eq!(details.pain_level.map(PainLevel::get), Some(3));
    }

    #[test]
    fn evolution_requires_description_and_valid_pain() {
        assert!(EvolutionDetails::try_from(form("   ", None)).is_err());
        assert!(EvolutionDetails::try_from(form("Ok", Some(11))).is_err());
    }

    #[test]
    fn record_blank_fields_are_absent() {
        let content = MedicalRecordContent::from(MedicalRecordForm {
            chief_complaint: Some("Dor no ombro".into()),
            allergies: Some("  ".into()),
            ..MedicalRecordForm::default()
        });
        assert!(content.chief_complaint.is_some());
        assert_eq!(content.allergies, None);
    }
}
