//! Period aggregations behind the financial and attendance reports.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::domain::appointment::{AppointmentStatus, AppointmentView};
use crate::domain::dashboard::{attendance_rate, month_bounds};
use crate::domain::types::{Money, ProfessionalId};

pub const UNCATEGORIZED: &str = "Sem categoria";

string_enum!(EntryKind {
    Income => "receita",
    Expense => "despesa",
});

/// A settled payable or receivable.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PaidEntry {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub description: String,
    pub category: Option<String>,
    pub amount: Money,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MonthlyTotals {
    /// `YYYY-MM`.
    pub month: String,
    pub received: Money,
    pub paid: Money,
    /// Signed difference in cents.
    pub balance: i64,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FinancialReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub months: Vec<MonthlyTotals>,
    pub income_by_category: BTreeMap<String, Money>,
    pub expense_by_category: BTreeMap<String, Money>,
    pub total_received: Money,
    pub total_paid: Money,
    pub balance: i64,
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

impl FinancialReport {
    /// Aggregates settled entries of `[from, to]` per month and category.
    /// Months without movement are still listed.
    pub fn build(from: NaiveDate, to: NaiveDate, entries: &[PaidEntry]) -> Self {
        let mut months: BTreeMap<String, (Money, Money)> = BTreeMap::new();
        let mut cursor = month_bounds(from).0;
        while cursor <= to {
            months.insert(month_key(cursor), (Money::ZERO, Money::ZERO));
            let next = month_bounds(cursor).1;
            if next <= cursor {
                break;
            }
            cursor = next;
        }

        let mut income_by_category = BTreeMap::new();
        let mut expense_by_category = BTreeMap::new();
        for entry in entries.iter().filter(|e| e.date >= from && e.date <= to) {
            let month = months
                .entry(month_key(entry.date))
                .or_insert((Money::ZERO, Money::ZERO));
            let by_category = match entry.kind {
                EntryKind::Income => {
                    month.0 = month.0 + entry.amount;
                    &mut income_by_category
                }
                EntryKind::Expense => {
                    month.1 = month.1 + entry.amount;
                    &mut expense_by_category
                }
            };
            let category = entry
                .category
                .clone()
                .unwrap_or_else(|| UNCATEGORIZED.to_string());
            let total: &mut Money = by_category.entry(category).or_insert(Money::ZERO);
            *total = *total + entry.amount;
        }

        let months: Vec<MonthlyTotals> = months
            .into_iter()
            .map(|(month, (received, paid))| MonthlyTotals {
                month,
                received,
                paid,
                balance: received.cents() - paid.cents(),
            })
            .collect();
        let total_received: Money = months.iter().map(|m| m.received).sum();
        let total_paid: Money = months.iter().map(|m| m.paid).sum();

        Self {
            from,
            to,
            months,
            income_by_category,
            expense_by_category,
            total_received,
            total_paid,
            balance: total_received.cents() - total_paid.cents(),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProfessionalAttendance {
    pub professional_id: ProfessionalId,
    pub professional_name: String,
    pub total: usize,
    pub by_status: BTreeMap<AppointmentStatus, usize>,
    pub attendance_rate: Option<f64>,
}

/// Appointment counts per professional, ordered by professional name.
pub fn attendance_by_professional(appointments: &[AppointmentView]) -> Vec<ProfessionalAttendance> {
    let mut rows: BTreeMap<ProfessionalId, ProfessionalAttendance> = BTreeMap::new();
    for view in appointments {
        let row = rows
            .entry(view.appointment.professional_id)
            .or_insert_with(|| ProfessionalAttendance {
                professional_id: view.appointment.professional_id,
                professional_name: view.professional_name.clone(),
                total: 0,
                by_status: BTreeMap::new(),
                attendance_rate: None,
            });
        row.total += 1;
        *row.by_status.entry(view.appointment.status).or_insert(0) += 1;
    }

    let mut rows: Vec<ProfessionalAttendance> = rows
        .into_values()
        .map(|mut row| {
            let count = |status| row.by_status.get(&status).copied().unwrap_or(0);
            let rate = attendance_rate(
                count(AppointmentStatus::Completed),
                count(AppointmentStatus::NoShow),
            );
            row.attendance_rate = rate;
            row
        })
        .collect();
    rows.sort_by(|a, b| a.professional_name.cmp(&b.professional_name));
    rows
}

#[cfg(test)]
mod tests {
    use chrono::NaiveTime;

    use super::*;
    use crate::domain::appointment::{Appointment, AppointmentKind};
    use crate::domain::types::{AppointmentId, ClinicId, PatientId};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn entry(kind: EntryKind, date: NaiveDate, category: Option<&str>, cents: i64) -> PaidEntry {
        PaidEntry {
            date,
            kind,
            description: "x".into(),
            category: category.map(str::to_string),
            amount: Money::from_cents(cents).unwrap(),
        }
    }

    #[test]
    fn financial_report_groups_months_and_categories() {
        let entries = vec![
            entry(EntryKind::Income, date(1, 5), Some("sessao"), 15_000),
            entry(EntryKind::Income, date(1, 20), None, 5_000),
            entry(EntryKind::Expense, date(1, 10), Some("aluguel"), 8_000),
            entry(EntryKind::Expense, date(3, 1), Some("aluguel"), 8_000),
            entry(EntryKind::Income, date(4, 1), Some("sessao"), 99_999),
        ];
        let report = FinancialReport::build(date(1, 1), date(3, 31), &entries);

        assert_eq!(
            report.months.iter().map(|m| m.month.as_str()).collect::<Vec<_>>(),
            ["2026-01", "2026-02", "2026-03"]
        );
        assert_eq!(report.months[0].received.cents(), 20_000);
        assert_eq!(report.months[0].balance, 12_000);
        assert_eq!(report.months[1].balance, 0);
        assert_eq!(report.months[2].balance, -8_000);
        assert_eq!(report.total_received.cents(), 20_000);
        assert_eq!(report.total_paid.cents(), 16_000);
        assert_eq!(report.balance, 4_000);
        assert_eq!(report.income_by_category[UNCATEGORIZED].cents(), 5_000);
        assert_eq!(report.expense_by_category["aluguel"].cents(), 16_000);
    }

    fn view(professional: i32, name: &str, status: AppointmentStatus) -> AppointmentView {
        let start = date(2, 2).and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        AppointmentView {
            appointment: Appointment {
                id: AppointmentId::new(1).unwrap(),
                clinic_id: ClinicId::new(1).unwrap(),
                patient_id: PatientId::new(1).unwrap(),
                professional_id: ProfessionalId::new(professional).unwrap(),
                room_id: None,
                package_id: None,
                starts_at: start,
                ends_at: start + chrono::Duration::hours(1),
                kind: AppointmentKind::Session,
                status,
                notes: None,
                recurrence_group: None,
                created_at: start,
                updated_at: start,
            },
            patient_name: "Paciente".into(),
            professional_name: name.into(),
            professional_color: "#3b82f6".into(),
            room_name: None,
        }
    }

    #[test]
    fn attendance_per_professional() {
        let views = vec![
            view(2, "Bruna", AppointmentStatus::Completed),
            view(2, "Bruna", AppointmentStatus::NoShow),
            view(2, "Bruna", AppointmentStatus::Completed),
            view(1, "Carlos", AppointmentStatus::Cancelled),
        ];
        let rows = attendance_by_professional(&views);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].professional_name, "Bruna");
        assert_eq!(rows[0].total, 3);
        assert!((rows[0].attendance_rate.unwrap() - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(rows[1].attendance_rate, None);
    }
}
