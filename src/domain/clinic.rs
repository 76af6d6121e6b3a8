//! Clinic tenants and their agenda/pricing settings.

use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ClinicId, ClinicName, Email, Money, PhoneNumber, TypeConstraintError};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Clinic {
    pub id: ClinicId,
    pub name: ClinicName,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewClinic {
    pub name: ClinicName,
}

impl NewClinic {
    #[must_use]
    pub fn new(name: ClinicName) -> Self {
        Self { name }
    }
}

/// Set of ISO weekday numbers (Monday = 1).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeekdaySet(Vec<u32>);

impl WeekdaySet {
    /// Builds a sorted, deduplicated set of ISO weekday numbers.
    pub fn new(days: impl IntoIterator<Item = u32>) -> Result<Self, TypeConstraintError> {
        let mut days: Vec<u32> = days.into_iter().collect();
        if let Some(day) = days.iter().find(|d| !(1..=7).contains(*d)) {
            return Err(TypeConstraintError::InvalidValue(format!("weekday {day}")));
        }
        days.sort_unstable();
        days.dedup();
        if days.is_empty() {
            return Err(TypeConstraintError::InvalidValue(
                "at least one weekday is required".to_string(),
            ));
        }
        Ok(Self(days))
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0.contains(&weekday.number_from_monday())
    }

    pub fn days(&self) -> &[u32] {
        &self.0
    }

    /// Comma separated representation used by the database column.
    pub fn to_db_string(&self) -> String {
        self.0
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for WeekdaySet {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let days = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| TypeConstraintError::InvalidValue(format!("weekday {part}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(days)
    }
}

impl Default for WeekdaySet {
    fn default() -> Self {
        Self(vec![1, 2, 3, 4, 5])
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClinicSettings {
    pub clinic_id: ClinicId,
    pub phone: Option<PhoneNumber>,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    pub slot_minutes: u32,
    pub working_days: WeekdaySet,
    pub default_session_price: Money,
}

impl ClinicSettings {
    pub const MIN_SLOT_MINUTES: u32 = 5;
    pub const MAX_SLOT_MINUTES: u32 = 240;

    /// Settings a freshly created clinic starts with: 08:00–18:00, hourly slots, Monday to Friday.
    #[must_use]
    pub fn defaults(clinic_id: ClinicId) -> Self {
        Self {
            clinic_id,
            phone: None,
            email: None,
            address: None,
            opening_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            closing_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: 60,
            working_days: WeekdaySet::default(),
            default_session_price: Money::ZERO,
        }
    }

    /// Checks the cross-field invariants of the agenda configuration.
    pub fn validate(&self) -> Result<(), TypeConstraintError> {
        if self.opening_time >= self.closing_time {
            return Err(TypeConstraintError::InvalidValue(
                "opening time must be before closing time".to_string(),
            ));
        }
        if !(Self::MIN_SLOT_MINUTES..=Self::MAX_SLOT_MINUTES).contains(&self.slot_minutes) {
            return Err(TypeConstraintError::InvalidValue(format!(
                "slot duration {} minutes",
                self.slot_minutes
            )));
        }
        Ok(())
    }

    pub fn is_working_day(&self, date: chrono::NaiveDate) -> bool {
        self.working_days.contains(date.weekday())
    }
}
