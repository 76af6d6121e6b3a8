//! Period reports over settled finance entries and appointments.

use crate::domain::appointment::{AppointmentFilter, AppointmentStatus};
use crate::domain::dashboard::{attendance_rate, count_by_status};
use crate::domain::permission::{Action, Module};
use crate::domain::report::{FinancialReport, PaidEntry, attendance_by_professional};
use crate::domain::types::ClinicId;
use crate::dto::reports::{AppointmentsReport, PeriodQuery};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{AppointmentReader, FinanceReader, MemberReader, PermissionReader};
use crate::services::access::ensure_permission;
use crate::services::{ServiceError, ServiceResult, log_failure};

const MAX_PERIOD_DAYS: i64 = 3660;

fn ensure_period(period: &PeriodQuery) -> ServiceResult<u32> {
    let days = (period.to - period.from).num_days() + 1;
    if days < 1 {
        return Err(ServiceError::Form(
            "A data final deve ser posterior à inicial".to_string(),
        ));
    }
    if days > MAX_PERIOD_DAYS {
        return Err(ServiceError::Form("Período máximo de 10 anos".to_string()));
    }
    Ok(days as u32)
}

fn paid_entries<R>(repo: &R, clinic_id: ClinicId, period: &PeriodQuery) -> ServiceResult<Vec<PaidEntry>>
where
    R: FinanceReader + ?Sized,
{
    let entries = repo
        .list_paid_entries(clinic_id, period.from, period.to)
        .map_err(log_failure("Failed to load paid entries"))?;
    Ok(entries)
}

/// Received, paid and balance per month of the period, with totals per category.
pub fn financial_report<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    period: PeriodQuery,
) -> ServiceResult<FinancialReport>
where
    R: FinanceReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Reports, Action::View)?;
    ensure_period(&period)?;
    let entries = paid_entries(repo, clinic_id, &period)?;
    Ok(FinancialReport::build(period.from, period.to, &entries))
}

/// Appointment counts per status and per professional over the period.
pub fn appointments_report<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    period: PeriodQuery,
) -> ServiceResult<AppointmentsReport>
where
    R: AppointmentReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Reports, Action::View)?;
    let days = ensure_period(&period)?;

    let filter = AppointmentFilter::for_days(period.from, days)?;
    let appointments = repo
        .list_appointments(clinic_id, &filter)
        .map_err(log_failure("Failed to load appointments"))?;

    let by_status = count_by_status(appointments.iter().map(|v| v.appointment.status));
    let count = |status| by_status.get(&status).copied().unwrap_or(0);
    let rate = attendance_rate(
        count(AppointmentStatus::Completed),
        count(AppointmentStatus::NoShow),
    );

    Ok(AppointmentsReport {
        from: period.from,
        to: period.to,
        total: appointments.len(),
        attendance_rate: rate,
        professionals: attendance_by_professional(&appointments),
        by_status,
    })
}

/// Settled entries of the period as CSV with a header row.
pub fn financial_csv<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    period: PeriodQuery,
) -> ServiceResult<String>
where
    R: FinanceReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Reports, Action::View)?;
    ensure_period(&period)?;
    let entries = paid_entries(repo, clinic_id, &period)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    let csv_error = |err: csv::Error| ServiceError::Internal(err.to_string());
    writer
        .write_record(["date", "kind", "description", "category", "amount"])
        .map_err(csv_error)?;
    for entry in &entries {
        writer
            .write_record([
                entry.date.format("%Y-%m-%d").to_string(),
                entry.kind.to_string(),
                entry.description.clone(),
                entry.category.clone().unwrap_or_default(),
                entry.amount.to_string(),
            ])
            .map_err(csv_error)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ServiceError::Internal(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ServiceError::Internal(err.to_string()))
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::member::Role;
    use crate::domain::report::EntryKind;
    use crate::domain::types::Money;
    use crate::services::access::test_support::*;

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    fn period() -> PeriodQuery {
        PeriodQuery {
            from: date(1, 1),
            to: date(2, 28),
        }
    }

    fn entries() -> Vec<PaidEntry> {
        vec![
            PaidEntry {
                date: date(1, 15),
                kind: EntryKind::Income,
                description: "Sessão, avulsa".into(),
                category: Some("sessao".into()),
                amount: Money::from_cents(15_050).unwrap(),
            },
            PaidEntry {
                date: date(2, 5),
                kind: EntryKind::Expense,
                description: "Aluguel".into(),
                category: None,
                amount: Money::from_cents(200_000).unwrap(),
            },
        ]
    }

    #[test]
    fn inverted_period_is_rejected() {
        let repo = repo_as(Role::Admin);
        let period = PeriodQuery {
            from: date(3, 1),
            to: date(2, 1),
        };
        assert!(matches!(
            financial_report(&repo, &user(), clinic(), period),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn receptionist_has_no_reports() {
        let repo = repo_as(Role::Receptionist);
        assert!(matches!(
            appointments_report(&repo, &user(), clinic(), period()),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn report_spans_each_month() {
        let mut repo = repo_as(Role::Financial);
        repo.expect_list_paid_entries()
            .returning(|_, _, _| Ok(entries()));

        let report = financial_report(&repo, &user(), clinic(), period()).unwrap();
        assert_eq!(report.months.len(), 2);
        assert_eq!(report.balance, 15_050 - 200_000);
    }

    #[test]
    fn csv_export_quotes_fields() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_list_paid_entries()
            .returning(|_, _, _| Ok(entries()));

        let csv = financial_csv(&repo, &user(), clinic(), period()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,kind,description,category,amount");
        assert_eq!(lines[1], "2026-01-15,receita,\"Sessão, avulsa\",sessao,150.50");
        assert_eq!(lines[2], "2026-02-05,despesa,Aluguel,,2000.00");
    }
}
