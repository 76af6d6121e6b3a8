//! Appointments, recurring series and slot availability.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::clinic::{ClinicSettings, WeekdaySet};
use crate::domain::types::{
    AppointmentId, ClinicId, PackageId, PatientId, ProfessionalId, RoomId, TypeConstraintError,
};

/// Longest single appointment accepted.
pub const MAX_DURATION_MINUTES: u32 = 720;

fn out_of_calendar() -> TypeConstraintError {
    TypeConstraintError::InvalidValue("date outside the supported calendar".to_string())
}

/// `at` moved forward by `minutes`.
pub fn add_minutes(at: NaiveDateTime, minutes: u32) -> Result<NaiveDateTime, TypeConstraintError> {
    at.checked_add_signed(Duration::minutes(i64::from(minutes)))
        .ok_or_else(out_of_calendar)
}

/// Rejects durations outside `1..=MAX_DURATION_MINUTES`.
pub fn ensure_duration(minutes: u32) -> Result<u32, TypeConstraintError> {
    if (1..=MAX_DURATION_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(TypeConstraintError::InvalidValue(format!(
            "duration {minutes} outside 1..={MAX_DURATION_MINUTES} minutes"
        )))
    }
}

string_enum!(AppointmentKind {
    Evaluation => "avaliacao",
    Session => "sessao",
    FollowUp => "retorno",
});

string_enum!(AppointmentStatus {
    Scheduled => "agendado",
    Confirmed => "confirmado",
    Completed => "realizado",
    NoShow => "faltou",
    Cancelled => "cancelado",
});

impl AppointmentStatus {
    /// Cancelled appointments free their slot.
    pub fn occupies_slot(self) -> bool {
        self != AppointmentStatus::Cancelled
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: AppointmentId,
    pub clinic_id: ClinicId,
    pub patient_id: PatientId,
    pub professional_id: ProfessionalId,
    pub room_id: Option<RoomId>,
    pub package_id: Option<PackageId>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub kind: AppointmentKind,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub recurrence_group: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn duration(&self) -> Duration {
        self.ends_at - self.starts_at
    }

    /// Start and end after moving the appointment to `new_start`, keeping its duration.
    pub fn shifted_to(
        &self,
        new_start: NaiveDateTime,
    ) -> Result<(NaiveDateTime, NaiveDateTime), TypeConstraintError> {
        let new_end = new_start
            .checked_add_signed(self.duration())
            .ok_or_else(out_of_calendar)?;
        Ok((new_start, new_end))
    }

    /// Editable attributes as currently stored.
    pub fn details(&self) -> AppointmentDetails {
        AppointmentDetails {
            patient_id: self.patient_id,
            professional_id: self.professional_id,
            room_id: self.room_id,
            package_id: self.package_id,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            kind: self.kind,
            notes: self.notes.clone(),
        }
    }
}

/// Editable attributes of an appointment.
#[derive(Clone, Debug, PartialEq)]
pub struct AppointmentDetails {
    pub patient_id: PatientId,
    pub professional_id: ProfessionalId,
    pub room_id: Option<RoomId>,
    pub package_id: Option<PackageId>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub kind: AppointmentKind,
    pub notes: Option<String>,
}

impl AppointmentDetails {
    pub fn validate(&self) -> Result<(), TypeConstraintError> {
        if self.ends_at <= self.starts_at {
            return Err(TypeConstraintError::InvalidValue(
                "appointment must end after it starts".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewAppointment {
    pub clinic_id: ClinicId,
    pub details: AppointmentDetails,
    pub status: AppointmentStatus,
    pub recurrence_group: Option<String>,
}

impl NewAppointment {
    #[must_use]
    pub fn scheduled(clinic_id: ClinicId, details: AppointmentDetails) -> Self {
        Self {
            clinic_id,
            details,
            status: AppointmentStatus::Scheduled,
            recurrence_group: None,
        }
    }
}

/// Appointment joined with the names the agenda displays.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
    pub professional_name: String,
    pub professional_color: String,
    pub room_name: Option<String>,
}

/// Filters for agenda listings over the half-open range `[from, to)`.
#[derive(Clone, Debug, PartialEq)]
pub struct AppointmentFilter {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub professional_id: Option<ProfessionalId>,
    pub room_id: Option<RoomId>,
    pub patient_id: Option<PatientId>,
    pub status: Option<AppointmentStatus>,
}

impl AppointmentFilter {
    /// Every appointment overlapping the given days.
    pub fn for_days(first_day: NaiveDate, days: u32) -> Result<Self, TypeConstraintError> {
        let last_day = first_day
            .checked_add_days(Days::new(u64::from(days)))
            .ok_or_else(out_of_calendar)?;
        Ok(Self {
            from: first_day.and_time(NaiveTime::MIN),
            to: last_day.and_time(NaiveTime::MIN),
            professional_id: None,
            room_id: None,
            patient_id: None,
            status: None,
        })
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub appointments: Vec<AppointmentView>,
}

/// Splits appointments into consecutive days starting at `first_day`.
/// Every day of the range is present, empty or not.
pub fn group_by_day(
    first_day: NaiveDate,
    days: u32,
    appointments: Vec<AppointmentView>,
) -> Vec<DaySchedule> {
    let mut schedule: Vec<DaySchedule> = first_day
        .iter_days()
        .take(days as usize)
        .map(|date| DaySchedule {
            date,
            appointments: Vec::new(),
        })
        .collect();

    for view in appointments {
        let date = view.appointment.starts_at.date();
        if let Some(day) = schedule.iter_mut().find(|day| day.date == date) {
            day.appointments.push(view);
        }
    }
    for day in &mut schedule {
        day.appointments
            .sort_by_key(|view| view.appointment.starts_at);
    }
    schedule
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> Result<NaiveDate, TypeConstraintError> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .ok_or_else(out_of_calendar)
}

/// Weekly repetition of one appointment.
#[derive(Clone, Debug, PartialEq)]
pub struct RecurrenceRule {
    pub first_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub weeks: u32,
    pub weekdays: WeekdaySet,
}

impl RecurrenceRule {
    pub const MAX_WEEKS: u32 = 52;

    pub fn new(
        first_date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: u32,
        weeks: u32,
        weekdays: WeekdaySet,
    ) -> Result<Self, TypeConstraintError> {
        if !(1..=Self::MAX_WEEKS).contains(&weeks) {
            return Err(TypeConstraintError::InvalidValue(format!(
                "weeks {weeks} outside 1..={}",
                Self::MAX_WEEKS
            )));
        }
        ensure_duration(duration_minutes)?;
        let last_day = first_date
            .checked_add_days(Days::new(u64::from(weeks) * 7))
            .ok_or_else(out_of_calendar)?;
        add_minutes(last_day.and_time(start_time), duration_minutes)?;
        Ok(Self {
            first_date,
            start_time,
            duration_minutes,
            weeks,
            weekdays,
        })
    }

    /// Start and end of every occurrence in chronological order.
    ///
    /// Each of the `weeks` seven-day windows starting at `first_date` yields one
    /// occurrence per selected weekday, so the series has exactly
    /// `weeks * weekdays.len()` entries and none precedes `first_date`.
    pub fn occurrences(&self) -> Vec<(NaiveDateTime, NaiveDateTime)> {
        self.first_date
            .iter_days()
            .take(self.weeks as usize * 7)
            .filter(|date| self.weekdays.contains(date.weekday()))
            .filter_map(|date| {
                let start = date.and_time(self.start_time);
                add_minutes(start, self.duration_minutes)
                    .ok()
                    .map(|end| (start, end))
            })
            .collect()
    }
}

/// Free start times of `date` for an appointment lasting `duration_minutes`.
///
/// Candidates step by the clinic slot size from opening time; a candidate is
/// kept when it ends by closing time and overlaps none of the `busy` intervals.
pub fn available_slots(
    date: NaiveDate,
    settings: &ClinicSettings,
    duration_minutes: u32,
    busy: &[(NaiveDateTime, NaiveDateTime)],
) -> Vec<NaiveTime> {
    if !settings.is_working_day(date) || settings.slot_minutes == 0 {
        return Vec::new();
    }
    let step = Duration::minutes(i64::from(settings.slot_minutes));
    let duration = Duration::minutes(i64::from(duration_minutes.max(1)));
    let closing = date.and_time(settings.closing_time);

    let mut slots = Vec::new();
    let mut start = date.and_time(settings.opening_time);
    while let Some(end) = start
        .checked_add_signed(duration)
        .filter(|end| *end <= closing)
    {
        if !busy.iter().any(|(from, to)| *from < end && *to > start) {
            slots.push(start.time());
        }
        match start.checked_add_signed(step) {
            Some(next) => start = next,
            None => break,
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn settings() -> ClinicSettings {
        ClinicSettings::defaults(ClinicId::new(1).unwrap())
    }

    #[test]
    fn recurrence_yields_weeks_times_weekdays() {
        // 2026-03-04 is a Wednesday.
        let weekdays: WeekdaySet = "1,3,5".parse().unwrap();
        let rule = RecurrenceRule::new(date(2026, 3, 4), time(9, 0), 50, 4, weekdays).unwrap();
        let occurrences = rule.occurrences();

        assert_eq!(occurrences.len(), 12);
        assert_eq!(occurrences[0].0, date(2026, 3, 4).and_time(time(9, 0)));
        assert_eq!(occurrences[0].1, date(2026, 3, 4).and_time(time(9, 50)));
        assert!(occurrences.iter().all(|(start, _)| start.date() >= date(2026, 3, 4)));
        assert!(occurrences.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(occurrences[11].0.date(), date(2026, 3, 30));
    }

    #[test]
    fn recurrence_single_day_single_week() {
        let weekdays: WeekdaySet = "2".parse().unwrap();
        let rule = RecurrenceRule::new(date(2026, 3, 2), time(14, 0), 60, 1, weekdays).unwrap();
        let occurrences = rule.occurrences();
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].0.date(), date(2026, 3, 3));
    }

    #[test]
    fn recurrence_rejects_out_of_range_weeks() {
        let weekdays = WeekdaySet::default();
        assert!(RecurrenceRule::new(date(2026, 3, 2), time(9, 0), 60, 0, weekdays.clone()).is_err());
        assert!(RecurrenceRule::new(date(2026, 3, 2), time(9, 0), 60, 53, weekdays.clone()).is_err());
        assert!(RecurrenceRule::new(date(2026, 3, 2), time(9, 0), 0, 2, weekdays).is_err());
    }

    #[test]
    fn slots_cover_opening_hours_when_free() {
        let slots = available_slots(date(2026, 3, 2), &settings(), 60, &[]);
        assert_eq!(slots.len(), 10);
        assert_eq!(slots.first(), Some(&time(8, 0)));
        assert_eq!(slots.last(), Some(&time(17, 0)));
    }

    #[test]
    fn slots_skip_busy_intervals() {
        let day = date(2026, 3, 2);
        let busy = [(day.and_time(time(9, 30)), day.and_time(time(10, 30)))];
        let slots = available_slots(day, &settings(), 60, &busy);
        assert!(!slots.contains(&time(9, 0)));
        assert!(!slots.contains(&time(10, 0)));
        assert!(slots.contains(&time(8, 0)));
        assert!(slots.contains(&time(11, 0)));
    }

    #[test]
    fn no_slots_outside_working_days() {
        // 2026-03-01 is a Sunday.
        assert!(available_slots(date(2026, 3, 1), &settings(), 60, &[]).is_empty());
    }

    #[test]
    fn week_start_is_monday() {
        assert_eq!(week_start(date(2026, 3, 5)), Ok(date(2026, 3, 2)));
        assert_eq!(week_start(date(2026, 3, 2)), Ok(date(2026, 3, 2)));
        assert_eq!(week_start(date(2026, 3, 8)), Ok(date(2026, 3, 2)));
    }

    #[test]
    fn calendar_edges_are_errors() {
        let last = NaiveDate::MAX.and_time(time(9, 0));
        assert!(add_minutes(last, 24 * 60).is_err());
        assert!(AppointmentFilter::for_days(NaiveDate::MAX, 7).is_err());
        assert!(AppointmentFilter::for_days(NaiveDate::MAX, 0).is_ok());

        let weekdays = WeekdaySet::default();
        assert!(RecurrenceRule::new(NaiveDate::MAX, time(9, 0), 60, 2, weekdays.clone()).is_err());
        assert!(RecurrenceRule::new(date(2026, 3, 2), time(9, 0), 721, 2, weekdays).is_err());
    }

    #[test]
    fn last_calendar_day_has_no_overflowing_slots() {
        let mut settings = settings();
        settings.working_days = "1,2,3,4,5,6,7".parse().unwrap();
        let slots = available_slots(NaiveDate::MAX, &settings, 60, &[]);
        assert_eq!(slots.len(), 10);
    }

    #[test]
    fn moving_an_appointment_keeps_its_duration() {
        let start = date(2026, 3, 2).and_time(time(9, 0));
        let appointment = Appointment {
            id: AppointmentId::new(1).unwrap(),
            clinic_id: ClinicId::new(1).unwrap(),
            patient_id: PatientId::new(1).unwrap(),
            professional_id: ProfessionalId::new(1).unwrap(),
            room_id: None,
            package_id: None,
            starts_at: start,
            ends_at: start + Duration::minutes(50),
            kind: AppointmentKind::Session,
            status: AppointmentStatus::Scheduled,
            notes: None,
            recurrence_group: None,
            created_at: start,
            updated_at: start,
        };

        let moved = date(2026, 3, 3).and_time(time(14, 0));
        assert_eq!(
            appointment.shifted_to(moved),
            Ok((moved, moved + Duration::minutes(50)))
        );
        assert!(appointment.shifted_to(NaiveDate::MAX.and_time(time(23, 30))).is_err());
    }

    #[test]
    fn status_parsing_and_slot_occupancy() {
        assert_eq!("realizado".parse(), Ok(AppointmentStatus::Completed));
        assert!("feito".parse::<AppointmentStatus>().is_err());
        assert!(!AppointmentStatus::Cancelled.occupies_slot());
        assert!(AppointmentStatus::NoShow.occupies_slot());
    }
}
