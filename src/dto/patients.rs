use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::appointment::AppointmentView;
use crate::domain::medical::Evolution;
use crate::domain::package::{PackageStatus, SessionPackage};
use crate::domain::patient::Patient;

/// Query parameters of the patient listing.
#[derive(Debug, Default, Deserialize)]
pub struct PatientsQuery {
    /// Matched against name, e-mail, CPF and phone.
    pub search: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub page: Option<usize>,
}

/// Session package with its derived balance.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PackageBalance {
    #[serde(flatten)]
    pub package: SessionPackage,
    pub remaining_sessions: u32,
    pub status: PackageStatus,
}

impl PackageBalance {
    pub fn new(package: SessionPackage, today: NaiveDate) -> Self {
        Self {
            remaining_sessions: package.remaining_sessions(),
            status: package.status(today),
            package,
        }
    }
}

/// Everything the patient page shows at once.
#[derive(Debug, Serialize)]
pub struct PatientHistory {
    pub patient: Patient,
    pub appointments: Vec<AppointmentView>,
    /// Empty when the caller may not read medical records.
    pub evolutions: Vec<Evolution>,
    pub packages: Vec<PackageBalance>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ImportOutcome {
    pub inserted: usize,
}
