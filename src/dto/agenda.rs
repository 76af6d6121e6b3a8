//! Agenda queries and the aggregates returned by the scheduling services.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::appointment::{Appointment, AppointmentFilter, AppointmentStatus};
use crate::domain::types::{PatientId, ProfessionalId, RoomId, TypeConstraintError};

#[derive(Debug, Deserialize)]
pub struct AppointmentsQuery {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub professional_id: Option<i32>,
    pub room_id: Option<i32>,
    pub patient_id: Option<i32>,
    pub status: Option<AppointmentStatus>,
}

impl TryFrom<AppointmentsQuery> for AppointmentFilter {
    type Error = TypeConstraintError;

    fn try_from(query: AppointmentsQuery) -> Result<Self, Self::Error> {
        if query.to <= query.from {
            return Err(TypeConstraintError::InvalidValue(
                "range end must follow its start".to_string(),
            ));
        }
        Ok(AppointmentFilter {
            from: query.from,
            to: query.to,
            professional_id: query.professional_id.map(ProfessionalId::new).transpose()?,
            room_id: query.room_id.map(RoomId::new).transpose()?,
            patient_id: query.patient_id.map(PatientId::new).transpose()?,
            status: query.status,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DayQuery {
    pub date: NaiveDate,
    pub professional_id: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeekQuery {
    /// Defaults to the Monday of the current week.
    pub start: Option<NaiveDate>,
    pub professional_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    pub professional_id: i32,
    /// Defaults to the clinic slot size.
    pub duration_minutes: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AvailableSlots {
    pub date: NaiveDate,
    pub professional_id: ProfessionalId,
    pub duration_minutes: u32,
    pub slots: Vec<NaiveTime>,
}

#[derive(Debug, Serialize)]
pub struct SeriesOutcome {
    pub recurrence_group: String,
    pub appointments: Vec<Appointment>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CancelledSeries {
    pub recurrence_group: String,
    pub cancelled: usize,
}
