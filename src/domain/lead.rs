use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::patient::PatientDetails;
use crate::domain::types::{ClinicId, Email, LeadId, PatientId, PersonName, PhoneNumber};

string_enum!(LeadStatus {
    New => "novo",
    Contacted => "contatado",
    Scheduled => "agendado",
    Converted => "convertido",
    Lost => "perdido",
});

/// Prospective patient tracked by the front desk.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Lead {
    pub id: LeadId,
    pub clinic_id: ClinicId,
    pub name: PersonName,
    pub phone: Option<PhoneNumber>,
    pub email: Option<Email>,
    /// Acquisition channel, e.g. "instagram" or "indicação".
    pub source: Option<String>,
    pub status: LeadStatus,
    pub notes: Option<String>,
    pub converted_patient_id: Option<PatientId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Lead {
    pub fn is_converted(&self) -> bool {
        self.status == LeadStatus::Converted || self.converted_patient_id.is_some()
    }

    /// Patient attributes carried over on conversion.
    pub fn patient_details(&self) -> PatientDetails {
        PatientDetails {
            phone: self.phone.clone(),
            email: self.email.clone(),
            notes: self.notes.clone(),
            ..PatientDetails::named(self.name.clone())
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeadDetails {
    pub name: PersonName,
    pub phone: Option<PhoneNumber>,
    pub email: Option<Email>,
    pub source: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewLead {
    pub clinic_id: ClinicId,
    pub details: LeadDetails,
    pub status: LeadStatus,
}

impl NewLead {
    #[must_use]
    pub fn new(clinic_id: ClinicId, details: LeadDetails) -> Self {
        Self {
            clinic_id,
            details,
            status: LeadStatus::New,
        }
    }
}
