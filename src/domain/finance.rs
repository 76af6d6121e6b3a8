//! Accounts payable and receivable.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    ClinicId, Description, Money, PackageId, PatientId, PayableId, ReceivableId,
};

string_enum!(PaymentStatus {
    Paid => "pago",
    Pending => "pendente",
    Overdue => "vencido",
});

impl PaymentStatus {
    /// Paid when a payment date exists, overdue when the due date is already
    /// behind `today`, pending otherwise.
    pub fn derive(due_date: NaiveDate, paid_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        match paid_date {
            Some(_) => PaymentStatus::Paid,
            None if due_date < today => PaymentStatus::Overdue,
            None => PaymentStatus::Pending,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Payable {
    pub id: PayableId,
    pub clinic_id: ClinicId,
    pub description: Description,
    pub supplier: Option<String>,
    pub category: Option<String>,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Payable {
    pub fn status(&self, today: NaiveDate) -> PaymentStatus {
        PaymentStatus::derive(self.due_date, self.paid_date, today)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PayableDetails {
    pub description: Description,
    pub supplier: Option<String>,
    pub category: Option<String>,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewPayable {
    pub clinic_id: ClinicId,
    pub details: PayableDetails,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Receivable {
    pub id: ReceivableId,
    pub clinic_id: ClinicId,
    pub patient_id: Option<PatientId>,
    pub package_id: Option<PackageId>,
    pub description: Description,
    pub category: Option<String>,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Receivable {
    pub fn status(&self, today: NaiveDate) -> PaymentStatus {
        PaymentStatus::derive(self.due_date, self.paid_date, today)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReceivableDetails {
    pub patient_id: Option<PatientId>,
    pub description: Description,
    pub category: Option<String>,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewReceivable {
    pub clinic_id: ClinicId,
    pub package_id: Option<PackageId>,
    pub details: ReceivableDetails,
}

/// Payment information recorded when an entry is settled.
#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    pub paid_date: NaiveDate,
    pub payment_method: Option<String>,
}

/// Listing filters shared by payables and receivables.
#[derive(Clone, Debug, PartialEq)]
pub struct FinanceFilter {
    pub today: NaiveDate,
    pub status: Option<PaymentStatus>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub category: Option<String>,
    pub patient_id: Option<PatientId>,
}

impl FinanceFilter {
    pub fn unfiltered(today: NaiveDate) -> Self {
        Self {
            today,
            status: None,
            due_from: None,
            due_to: None,
            category: None,
            patient_id: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StatusTotal {
    pub count: usize,
    pub amount: Money,
}

impl StatusTotal {
    fn add(&mut self, amount: Money) {
        self.count += 1;
        self.amount = self.amount + amount;
    }
}

/// Counts and amounts per derived status.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FinanceSummary {
    pub paid: StatusTotal,
    pub pending: StatusTotal,
    pub overdue: StatusTotal,
    pub total: StatusTotal,
}

impl FinanceSummary {
    /// Folds `(due_date, paid_date, amount)` triples into per-status totals.
    pub fn from_entries<I>(entries: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, Option<NaiveDate>, Money)>,
    {
        entries
            .into_iter()
            .fold(Self::default(), |mut summary, (due, paid, amount)| {
                match PaymentStatus::derive(due, paid, today) {
                    PaymentStatus::Paid => summary.paid.add(amount),
                    PaymentStatus::Pending => summary.pending.add(amount),
                    PaymentStatus::Overdue => summary.overdue.add(amount),
                }
                summary.total.add(amount);
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    #[test]
    fn status_derivation() {
        let today = date(3, 10);
        assert_eq!(PaymentStatus::derive(date(3, 1), Some(date(3, 2)), today), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::derive(date(3, 20), Some(date(3, 2)), today), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::derive(date(3, 9), None, today), PaymentStatus::Overdue);
        assert_eq!(PaymentStatus::derive(date(3, 10), None, today), PaymentStatus::Pending);
        assert_eq!(PaymentStatus::derive(date(4, 1), None, today), PaymentStatus::Pending);
    }

    #[test]
    fn summary_groups_amounts_by_status() {
        let cents = |v| Money::from_cents(v).unwrap();
        let entries = vec![
            (date(3, 1), Some(date(3, 1)), cents(10_000)),
            (date(3, 5), None, cents(2_500)),
            (date(3, 6), None, cents(500)),
            (date(3, 15), None, cents(7_000)),
        ];
        let summary = FinanceSummary::from_entries(entries, date(3, 10));
        assert_eq!(summary.paid, StatusTotal { count: 1, amount: cents(10_000) });
        assert_eq!(summary.overdue, StatusTotal { count: 2, amount: cents(3_000) });
        assert_eq!(summary.pending, StatusTotal { count: 1, amount: cents(7_000) });
        assert_eq!(summary.total.count, 4);
        assert_eq!(summary.total.amount, cents(20_000));
    }
}
