use chrono::{Duration, NaiveDate, NaiveTime};

use crate::domain::appointment::{AppointmentFilter, AppointmentStatus};
use crate::domain::dashboard::{
    Dashboard, FinancialSnapshot, attendance_rate, count_by_status, month_bounds,
};
use crate::domain::finance::{FinanceFilter, FinanceSummary};
use crate::domain::permission::{Action, Module};
use crate::domain::report::EntryKind;
use crate::domain::types::{ClinicId, Money};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    AppointmentReader, FinanceReader, LeadReader, MemberReader, PatientReader, PermissionReader,
};
use crate::services::access::{effective_permissions, ensure_permission};
use crate::services::leads::count_new_leads;
use crate::services::{ServiceResult, log_failure};

const ATTENDANCE_WINDOW_DAYS: u32 = 30;

/// Figures of the home screen for `today`. Financial figures are filled
/// only for members allowed to view the financial module.
pub fn dashboard<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    today: NaiveDate,
) -> ServiceResult<Dashboard>
where
    R: AppointmentReader
        + PatientReader
        + LeadReader
        + FinanceReader
        + MemberReader
        + PermissionReader
        + ?Sized,
{
    let member = ensure_permission(repo, user, clinic_id, Module::Agenda, Action::View)?;

    let today_appointments = repo
        .list_appointments(clinic_id, &AppointmentFilter::for_days(today, 1)?)
        .map_err(log_failure("Failed to load today's appointments"))?;
    let appointments_by_status =
        count_by_status(today_appointments.iter().map(|v| v.appointment.status));

    let window = AppointmentFilter::for_days(
        today - Duration::days(i64::from(ATTENDANCE_WINDOW_DAYS)),
        ATTENDANCE_WINDOW_DAYS,
    )?;
    let recent = repo
        .list_appointments(clinic_id, &window)
        .map_err(log_failure("Failed to load recent appointments"))?;
    let recent_counts = count_by_status(recent.iter().map(|v| v.appointment.status));
    let count = |status| recent_counts.get(&status).copied().unwrap_or(0);

    let active_patients = repo
        .count_active_patients(clinic_id)
        .map_err(log_failure("Failed to count patients"))?;

    let (month_start, next_month) = month_bounds(today);
    let new_leads_this_month = count_new_leads(
        repo,
        clinic_id,
        month_start.and_time(NaiveTime::MIN),
        next_month.and_time(NaiveTime::MIN),
    )?;

    let financial = if effective_permissions(repo, clinic_id, member.role)?
        .allows(Module::Financial, Action::View)
    {
        Some(financial_snapshot(repo, clinic_id, today)?)
    } else {
        None
    };

    Ok(Dashboard {
        date: today,
        appointments_today: today_appointments.len(),
        appointments_by_status,
        active_patients,
        new_leads_this_month,
        attendance_rate_30d: attendance_rate(
            count(AppointmentStatus::Completed),
            count(AppointmentStatus::NoShow),
        ),
        financial,
    })
}

fn financial_snapshot<R>(
    repo: &R,
    clinic_id: ClinicId,
    today: NaiveDate,
) -> ServiceResult<FinancialSnapshot>
where
    R: FinanceReader + ?Sized,
{
    let (month_start, next_month) = month_bounds(today);
    let month_end = next_month.pred_opt().unwrap_or(month_start);
    let paid = repo
        .list_paid_entries(clinic_id, month_start, month_end)
        .map_err(log_failure("Failed to load paid entries"))?;
    let total_of = |kind: EntryKind| -> Money {
        paid.iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.amount)
            .sum()
    };

    let receivables = repo
        .list_receivables(clinic_id, &FinanceFilter::unfiltered(today))
        .map_err(log_failure("Failed to load receivables"))?;
    let summary = FinanceSummary::from_entries(
        receivables.iter().map(|r| (r.due_date, r.paid_date, r.amount)),
        today,
    );

    Ok(FinancialSnapshot {
        received_this_month: total_of(EntryKind::Income),
        paid_this_month: total_of(EntryKind::Expense),
        pending_receivables: summary.pending.amount,
        overdue_receivables: summary.overdue.amount,
    })
}
