//! Accounts payable and receivable.

use chrono::NaiveDate;

use crate::domain::finance::{
    FinanceFilter, FinanceSummary, NewPayable, NewReceivable, Payable, PayableDetails, Receivable,
    ReceivableDetails,
};
use crate::domain::permission::{Action, Module};
use crate::domain::types::{ClinicId, PayableId, ReceivableId};
use crate::dto::finance::{FinanceOverview, FinanceQuery, PayableView, ReceivableView};
use crate::forms::finance::{PayableForm, ReceivableForm, SettlementForm};
use crate::models::auth::AuthenticatedUser;
use crate::repository::{
    FinanceReader, FinanceWriter, MemberReader, PatientReader, PermissionReader,
};
use crate::services::access::ensure_permission;
use crate::services::{ServiceError, ServiceResult, log_failure};

pub fn list_payables<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    query: FinanceQuery,
    today: NaiveDate,
) -> ServiceResult<Vec<PayableView>>
where
    R: FinanceReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::View)?;
    let filter = FinanceFilter {
        patient_id: None,
        ..query.into_filter(today)?
    };
    let payables = repo
        .list_payables(clinic_id, &filter)
        .map_err(log_failure("Failed to list payables"))?
        .into_iter()
        .map(|payable| PayableView::new(payable, today))
        .collect();
    Ok(payables)
}

fn load_payable<R>(repo: &R, clinic_id: ClinicId, payable_id: i32) -> ServiceResult<Payable>
where
    R: FinanceReader + ?Sized,
{
    repo.get_payable(clinic_id, PayableId::new(payable_id)?)
        .map_err(log_failure("Failed to load payable"))?
        .ok_or(ServiceError::NotFound)
}

pub fn get_payable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    payable_id: i32,
    today: NaiveDate,
) -> ServiceResult<PayableView>
where
    R: FinanceReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::View)?;
    Ok(PayableView::new(load_payable(repo, clinic_id, payable_id)?, today))
}

pub fn create_payable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: PayableForm,
    today: NaiveDate,
) -> ServiceResult<PayableView>
where
    R: FinanceWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::Create)?;
    let details = PayableDetails::try_from(form)?;
    let payable = repo
        .create_payable(&NewPayable { clinic_id, details })
        .map_err(log_failure("Failed to create payable"))?;
    Ok(PayableView::new(payable, today))
}

pub fn update_payable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    payable_id: i32,
    form: PayableForm,
    today: NaiveDate,
) -> ServiceResult<PayableView>
where
    R: FinanceWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::Edit)?;
    let details = PayableDetails::try_from(form)?;
    let payable = repo
        .update_payable(clinic_id, PayableId::new(payable_id)?, &details)
        .map_err(log_failure("Failed to update payable"))?;
    Ok(PayableView::new(payable, today))
}

/// Records the payment; the date defaults to `today`.
pub fn mark_payable_paid<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    payable_id: i32,
    form: SettlementForm,
    today: NaiveDate,
) -> ServiceResult<PayableView>
where
    R: FinanceWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::Edit)?;
    let settlement = form.into_settlement(today);
    let payable = repo
        .settle_payable(clinic_id, PayableId::new(payable_id)?, Some(&settlement))
        .map_err(log_failure("Failed to settle payable"))?;
    Ok(PayableView::new(payable, today))
}

pub fn mark_payable_unpaid<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    payable_id: i32,
    today: NaiveDate,
) -> ServiceResult<PayableView>
where
    R: FinanceWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::Edit)?;
    let payable = repo
        .settle_payable(clinic_id, PayableId::new(payable_id)?, None)
        .map_err(log_failure("Failed to reopen payable"))?;
    Ok(PayableView::new(payable, today))
}

pub fn delete_payable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    payable_id: i32,
) -> ServiceResult<()>
where
    R: FinanceWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::Delete)?;
    repo.delete_payable(clinic_id, PayableId::new(payable_id)?)
        .map_err(log_failure("Failed to delete payable"))?;
    Ok(())
}

pub fn list_receivables<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    query: FinanceQuery,
    today: NaiveDate,
) -> ServiceResult<Vec<ReceivableView>>
where
    R: FinanceReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::View)?;
    let filter = query.into_filter(today)?;
    let receivables = repo
        .list_receivables(clinic_id, &filter)
        .map_err(log_failure("Failed to list receivables"))?
        .into_iter()
        .map(|receivable| ReceivableView::new(receivable, today))
        .collect();
    Ok(receivables)
}

fn load_receivable<R>(repo: &R, clinic_id: ClinicId, receivable_id: i32) -> ServiceResult<Receivable>
where
    R: FinanceReader + ?Sized,
{
    repo.get_receivable(clinic_id, ReceivableId::new(receivable_id)?)
        .map_err(log_failure("Failed to load receivable"))?
        .ok_or(ServiceError::NotFound)
}

pub fn get_receivable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    receivable_id: i32,
    today: NaiveDate,
) -> ServiceResult<ReceivableView>
where
    R: FinanceReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::View)?;
    Ok(ReceivableView::new(
        load_receivable(repo, clinic_id, receivable_id)?,
        today,
    ))
}

fn ensure_patient<R>(repo: &R, clinic_id: ClinicId, details: &ReceivableDetails) -> ServiceResult<()>
where
    R: PatientReader + ?Sized,
{
    if let Some(patient_id) = details.patient_id {
        repo.get_patient(clinic_id, patient_id)
            .map_err(log_failure("Failed to load patient"))?
            .ok_or_else(|| ServiceError::Form("Paciente inválido".to_string()))?;
    }
    Ok(())
}

pub fn create_receivable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    form: ReceivableForm,
    today: NaiveDate,
) -> ServiceResult<ReceivableView>
where
    R: FinanceWriter + PatientReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::Create)?;
    let details = ReceivableDetails::try_from(form)?;
    ensure_patient(repo, clinic_id, &details)?;

    let receivable = repo
        .create_receivable(&NewReceivable {
            clinic_id,
            package_id: None,
            details,
        })
        .map_err(log_failure("Failed to create receivable"))?;
    Ok(ReceivableView::new(receivable, today))
}

pub fn update_receivable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    receivable_id: i32,
    form: ReceivableForm,
    today: NaiveDate,
) -> ServiceResult<ReceivableView>
where
    R: FinanceWriter + PatientReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::Edit)?;
    let details = ReceivableDetails::try_from(form)?;
    ensure_patient(repo, clinic_id, &details)?;

    let receivable = repo
        .update_receivable(clinic_id, ReceivableId::new(receivable_id)?, &details)
        .map_err(log_failure("Failed to update receivable"))?;
    Ok(ReceivableView::new(receivable, today))
}

pub fn mark_receivable_paid<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    receivable_id: i32,
    form: SettlementForm,
    today: NaiveDate,
) -> ServiceResult<ReceivableView>
where
    R: FinanceWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::Edit)?;
    let settlement = form.into_settlement(today);
    let receivable = repo
        .settle_receivable(clinic_id, ReceivableId::new(receivable_id)?, Some(&settlement))
        .map_err(log_failure("Failed to settle receivable"))?;
    Ok(ReceivableView::new(receivable, today))
}

pub fn mark_receivable_unpaid<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    receivable_id: i32,
    today: NaiveDate,
) -> ServiceResult<ReceivableView>
where
    R: FinanceWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::Edit)?;
    let receivable = repo
        .settle_receivable(clinic_id, ReceivableId::new(receivable_id)?, None)
        .map_err(log_failure("Failed to reopen receivable"))?;
    Ok(ReceivableView::new(receivable, today))
}

pub fn delete_receivable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    receivable_id: i32,
) -> ServiceResult<()>
where
    R: FinanceWriter + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::Delete)?;
    repo.delete_receivable(clinic_id, ReceivableId::new(receivable_id)?)
        .map_err(log_failure("Failed to delete receivable"))?;
    Ok(())
}

/// Totals and counts per status for both sides, over the same filters the
/// listings accept.
pub fn summary<R>(
    repo: &R,
    user: &AuthenticatedUser,
    clinic_id: ClinicId,
    query: FinanceQuery,
    today: NaiveDate,
) -> ServiceResult<FinanceOverview>
where
    R: FinanceReader + MemberReader + PermissionReader + ?Sized,
{
    ensure_permission(repo, user, clinic_id, Module::Financial, Action::View)?;
    let filter = query.into_filter(today)?;

    let payables = repo
        .list_payables(
            clinic_id,
            &FinanceFilter {
                patient_id: None,
                ..filter.clone()
            },
        )
        .map_err(log_failure("Failed to list payables"))?;
    let receivables = repo
        .list_receivables(clinic_id, &filter)
        .map_err(log_failure("Failed to list receivables"))?;

    Ok(FinanceOverview {
        payables: FinanceSummary::from_entries(
            payables.iter().map(|p| (p.due_date, p.paid_date, p.amount)),
            today,
        ),
        receivables: FinanceSummary::from_entries(
            receivables.iter().map(|r| (r.due_date, r.paid_date, r.amount)),
            today,
        ),
    })
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use chrono::{Duration, NaiveDateTime};

    use super::*;
    use crate::domain::finance::PaymentStatus;
    use crate::domain::member::Role;
    use crate::domain::types::{Description, Money};
    use crate::services::access::test_support::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn stamp() -> NaiveDateTime {
        today().and_hms_opt(8, 0, 0).unwrap()
    }

    fn payable(id: i32, due: NaiveDate, paid: Option<NaiveDate>, cents: i64) -> Payable {
        Payable {
            id: PayableId::new(id).unwrap(),
            clinic_id: clinic(),
            description: Description::new("Aluguel").unwrap(),
            supplier: None,
            category: Some("aluguel".into()),
            amount: Money::from_cents(cents).unwrap(),
            due_date: due,
            paid_date: paid,
            payment_method: None,
            notes: None,
            created_at: stamp(),
        }
    }

    #[test]
    fn listing_derives_status() {
        let mut repo = repo_as(Role::Financial);
        repo.expect_list_payables().returning(|_, _| {
            Ok(vec![
                payable(1, today() - Duration::days(1), None, 100),
                payable(2, today(), None, 100),
                payable(3, today() - Duration::days(5), Some(today()), 100),
            ])
        });

        let views = list_payables(&repo, &user(), clinic(), FinanceQuery::default(), today())
            .unwrap();
        let statuses: Vec<_> = views.iter().map(|v| v.status).collect();
        assert_eq!(
            statuses,
            [
                PaymentStatus::Overdue,
                PaymentStatus::Pending,
                PaymentStatus::Paid
            ]
        );
    }

    #[test]
    fn payment_date_defaults_to_today() {
        let mut repo = repo_as(Role::Financial);
        repo.expect_settle_payable()
            .withf(|_, _, settlement| {
                settlement.is_some_and(|s| s.paid_date == today() && s.payment_method.is_none())
            })
            .returning(|_, id, settlement| {
                Ok(payable(
                    id.get(),
                    today(),
                    settlement.map(|s| s.paid_date),
                    500,
                ))
            });

        let view = mark_payable_paid(
            &repo,
            &user(),
            clinic(),
            1,
            SettlementForm::default(),
            today(),
        )
        .unwrap();
        assert_eq!(view.status, PaymentStatus::Paid);
    }

    #[test]
    fn receptionist_cannot_delete_entries() {
        let repo = repo_as(Role::Receptionist);
        assert!(matches!(
            delete_receivable(&repo, &user(), clinic(), 1),
            Err(ServiceError::Forbidden)
        ));
    }

    #[test]
    fn summary_counts_each_status() {
        let mut repo = repo_as(Role::Admin);
        repo.expect_list_payables().returning(|_, _| {
            Ok(vec![
                payable(1, today() - Duration::days(1), None, 1_000),
                payable(2, today(), Some(today()), 2_500),
            ])
        });
        repo.expect_list_receivables().returning(|_, _| Ok(vec![]));

        let overview =
            summary(&repo, &user(), clinic(), FinanceQuery::default(), today()).unwrap();
        assert_eq!(overview.payables.overdue.count, 1);
        assert_eq!(overview.payables.paid.amount.cents(), 2_500);
        assert_eq!(overview.payables.total.amount.cents(), 3_500);
        assert_eq!(overview.receivables.total.count, 0);
    }
}
