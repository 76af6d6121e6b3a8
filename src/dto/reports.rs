use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::appointment::AppointmentStatus;
use crate::domain::report::ProfessionalAttendance;

/// Inclusive reporting period.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PeriodQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct AppointmentsReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total: usize,
    pub by_status: BTreeMap<AppointmentStatus, usize>,
    pub attendance_rate: Option<f64>,
    pub professionals: Vec<ProfessionalAttendance>,
}
