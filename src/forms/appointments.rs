use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use validator::Validate;

use crate::domain::appointment::{
    AppointmentDetails, AppointmentKind, AppointmentStatus, RecurrenceRule, add_minutes,
    ensure_duration,
};
use crate::domain::clinic::WeekdaySet;
use crate::domain::types::{PackageId, PatientId, ProfessionalId, RoomId, clean_optional};
use crate::forms::{FormError, parse_time};

fn default_kind() -> AppointmentKind {
    AppointmentKind::Session
}

/// References shared by single and recurring appointments.
#[derive(Deserialize, Validate)]
pub struct AppointmentRefs {
    pub patient_id: i32,
    pub professional_id: i32,
    pub room_id: Option<i32>,
    pub package_id: Option<i32>,
    #[serde(default = "default_kind")]
    pub kind: AppointmentKind,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl AppointmentRefs {
    fn into_details(
        self,
        starts_at: NaiveDateTime,
        ends_at: NaiveDateTime,
    ) -> Result<AppointmentDetails, FormError> {
        self.validate()?;
        let details = AppointmentDetails {
            patient_id: PatientId::new(self.patient_id)?,
            professional_id: ProfessionalId::new(self.professional_id)?,
            room_id: self.room_id.map(RoomId::new).transpose()?,
            package_id: self.package_id.map(PackageId::new).transpose()?,
            starts_at,
            ends_at,
            kind: self.kind,
            notes: clean_optional(self.notes),
        };
        details.validate()?;
        Ok(details)
    }
}

#[derive(Deserialize)]
pub struct AppointmentForm {
    #[serde(flatten)]
    pub refs: AppointmentRefs,
    pub starts_at: NaiveDateTime,
    /// Either `ends_at` or `duration_minutes` must be given.
    pub ends_at: Option<NaiveDateTime>,
    pub duration_minutes: Option<u32>,
}

impl TryFrom<AppointmentForm> for AppointmentDetails {
    type Error = FormError;

    fn try_from(form: AppointmentForm) -> Result<Self, Self::Error> {
        let ends_at = match (form.ends_at, form.duration_minutes) {
            (Some(ends_at), _) => ends_at,
            (None, Some(minutes)) => add_minutes(form.starts_at, ensure_duration(minutes)?)?,
            (None, None) => {
                return Err(FormError::InvalidField(
                    "informe o término ou a duração".to_string(),
                ));
            }
        };
        form.refs.into_details(form.starts_at, ends_at)
    }
}

#[derive(Deserialize)]
pub struct RecurringForm {
    #[serde(flatten)]
    pub refs: AppointmentRefs,
    pub first_date: NaiveDate,
    /// `HH:MM`.
    pub start_time: String,
    pub duration_minutes: u32,
    pub weeks: u32,
    /// ISO weekday numbers, Monday = 1.
    pub weekdays: Vec<u32>,
}

/// Template of the series plus the rule that places its occurrences.
pub struct RecurringPayload {
    pub template: AppointmentDetails,
    pub rule: RecurrenceRule,
}

impl TryFrom<RecurringForm> for RecurringPayload {
    type Error = FormError;

    fn try_from(form: RecurringForm) -> Result<Self, Self::Error> {
        let weekdays = WeekdaySet::new(form.weekdays)
            .map_err(|_| FormError::InvalidField("selecione ao menos um dia".to_string()))?;
        let rule = RecurrenceRule::new(
            form.first_date,
            parse_time(&form.start_time)?,
            form.duration_minutes,
            form.weeks,
            weekdays,
        )?;
        let starts_at = form.first_date.and_time(rule.start_time);
        let ends_at = add_minutes(starts_at, rule.duration_minutes)?;
        let template = form.refs.into_details(starts_at, ends_at)?;
        Ok(Self { template, rule })
    }
}

#[derive(Deserialize)]
pub struct RescheduleForm {
    pub starts_at: NaiveDateTime,
    pub professional_id: Option<i32>,
    pub room_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct StatusForm {
    pub status: AppointmentStatus,
}

#[derive(Deserialize)]
pub struct CancelSeriesForm {
    /// Defaults to now.
    pub from: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn refs() -> AppointmentRefs {
        AppointmentRefs {
            patient_id: 1,
            professional_id: 2,
            room_id: None,
            package_id: Some(4),
            kind: AppointmentKind::Evaluation,
            notes: Some("  ".into()),
        }
    }

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn duration_sets_end() {
        let details = AppointmentDetails::try_from(AppointmentForm {
            refs: refs(),
            starts_at: at(9),
            ends_at: None,
            duration_minutes: Some(50),
        })
        .unwrap();
        assert_eq!(details.ends_at, at(9) + Duration::minutes(50));
        assert_eq!(details.notes, None);
    }

    #[test]
    fn end_must_follow_start() {
        let form = AppointmentForm {
            refs: refs(),
            starts_at: at(10),
            ends_at: Some(at(9)),
            duration_minutes: None,
        };
        assert!(AppointmentDetails::try_from(form).is_err());
    }

    #[test]
    fn far_future_start_with_huge_duration_is_rejected() {
        let form: AppointmentForm = serde_json::from_str(
            r#"{"patient_id":1,"professional_id":2,"starts_at":"+262000-01-01T09:00:00","duration_minutes":4000000000}"#,
        )
        .unwrap();
        assert!(matches!(
            AppointmentDetails::try_from(form),
            Err(FormError::InvalidField(_))
        ));
    }

    #[test]
    fn duration_past_the_calendar_is_rejected() {
        let form = AppointmentForm {
            refs: refs(),
            starts_at: NaiveDate::MAX.and_hms_opt(23, 0, 0).unwrap(),
            ends_at: None,
            duration_minutes: Some(120),
        };
        assert!(matches!(
            AppointmentDetails::try_from(form),
            Err(FormError::InvalidField(_))
        ));
    }

    #[test]
    fn recurring_form_builds_rule() {
        let payload = RecurringPayload::try_from(RecurringForm {
            refs: refs(),
            first_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            start_time: "14:00".into(),
            duration_minutes: 60,
            weeks: 4,
            weekdays: vec![1, 3],
        })
        .unwrap();
        assert_eq!(payload.rule.occurrences().len(), 8);
        assert_eq!(payload.template.kind, AppointmentKind::Evaluation);
    }

    #[test]
    fn recurring_form_needs_weekdays() {
        let form = RecurringForm {
            refs: refs(),
            first_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            start_time: "14:00".into(),
            duration_minutes: 60,
            weeks: 4,
            weekdays: vec![],
        };
        assert!(matches!(
            RecurringPayload::try_from(form),
            Err(FormError::InvalidField(_))
        ));
    }

    #[test]
    fn status_uses_wire_names() {
        let form: StatusForm = serde_json::from_str(r#"{"status":"faltou"}"#).unwrap();
        assert_eq!(form.status, AppointmentStatus::NoShow);
    }
}
