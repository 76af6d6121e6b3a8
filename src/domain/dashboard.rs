use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::domain::appointment::AppointmentStatus;
use crate::domain::types::Money;

/// First day of the month of `date` and first day of the following month.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    (first, next.unwrap_or(first))
}

/// Share of attended sessions among those that were either attended or missed.
pub fn attendance_rate(completed: usize, no_show: usize) -> Option<f64> {
    let denominator = completed + no_show;
    (denominator > 0).then(|| completed as f64 / denominator as f64)
}

pub fn count_by_status<I>(statuses: I) -> BTreeMap<AppointmentStatus, usize>
where
    I: IntoIterator<Item = AppointmentStatus>,
{
    statuses.into_iter().fold(BTreeMap::new(), |mut counts, status| {
        *counts.entry(status).or_insert(0) += 1;
        counts
    })
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct FinancialSnapshot {
    pub received_this_month: Money,
    pub paid_this_month: Money,
    pub pending_receivables: Money,
    pub overdue_receivables: Money,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub appointments_today: usize,
    pub appointments_by_status: BTreeMap<AppointmentStatus, usize>,
    pub active_patients: i64,
    pub new_leads_this_month: i64,
    pub attendance_rate_30d: Option<f64>,
    /// Present only for members allowed to see financial data.
    pub financial: Option<FinancialSnapshot>,
}
