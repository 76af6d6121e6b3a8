//! Diesel models for accounts payable and receivable.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::finance::{
    NewPayable as DomainNewPayable, NewReceivable as DomainNewReceivable,
    Payable as DomainPayable, PayableDetails, Receivable as DomainReceivable, ReceivableDetails,
    Settlement,
};
use crate::domain::types::{
    ClinicId, Description, Money, PackageId, PatientId, PayableId, ReceivableId,
    TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::payables)]
pub struct Payable {
    pub id: i32,
    pub clinic_id: i32,
    pub description: String,
    pub supplier: Option<String>,
    pub category: Option<String>,
    pub amount: i64,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset, Insertable)]
#[diesel(table_name = crate::schema::payables)]
#[diesel(treat_none_as_null = true)]
pub struct UpdatePayable<'a> {
    pub description: &'a str,
    pub supplier: Option<&'a str>,
    pub category: Option<&'a str>,
    pub amount: i64,
    pub due_date: NaiveDate,
    pub notes: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::payables)]
pub struct NewPayable<'a> {
    pub clinic_id: i32,
    #[diesel(embed)]
    pub details: UpdatePayable<'a>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::receivables)]
pub struct Receivable {
    pub id: i32,
    pub clinic_id: i32,
    pub patient_id: Option<i32>,
    pub package_id: Option<i32>,
    pub description: String,
    pub category: Option<String>,
    pub amount: i64,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(AsChangeset, Insertable)]
#[diesel(table_name = crate::schema::receivables)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateReceivable<'a> {
    pub patient_id: Option<i32>,
    pub description: &'a str,
    pub category: Option<&'a str>,
    pub amount: i64,
    pub due_date: NaiveDate,
    pub notes: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::receivables)]
pub struct NewReceivable<'a> {
    pub clinic_id: i32,
    pub package_id: Option<i32>,
    #[diesel(embed)]
    pub details: UpdateReceivable<'a>,
    pub created_at: NaiveDateTime,
}

/// Payment columns shared by both tables; `None` clears a settlement.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::payables)]
#[diesel(treat_none_as_null = true)]
pub struct PayableSettlement<'a> {
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::receivables)]
#[diesel(treat_none_as_null = true)]
pub struct ReceivableSettlement<'a> {
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<&'a str>,
}

impl TryFrom<Payable> for DomainPayable {
    type Error = TypeConstraintError;

    fn try_from(row: Payable) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PayableId::try_from(row.id)?,
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            description: Description::new(row.description)?,
            supplier: row.supplier,
            category: row.category,
            amount: Money::from_cents(row.amount)?,
            due_date: row.due_date,
            paid_date: row.paid_date,
            payment_method: row.payment_method,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a PayableDetails> for UpdatePayable<'a> {
    fn from(d: &'a PayableDetails) -> Self {
        Self {
            description: d.description.as_str(),
            supplier: d.supplier.as_deref(),
            category: d.category.as_deref(),
            amount: d.amount.cents(),
            due_date: d.due_date,
            notes: d.notes.as_deref(),
        }
    }
}

impl<'a> NewPayable<'a> {
    pub fn from_domain(payable: &'a DomainNewPayable, now: NaiveDateTime) -> Self {
        Self {
            clinic_id: payable.clinic_id.get(),
            details: (&payable.details).into(),
            created_at: now,
        }
    }
}

impl TryFrom<Receivable> for DomainReceivable {
    type Error = TypeConstraintError;

    fn try_from(row: Receivable) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReceivableId::try_from(row.id)?,
            clinic_id: ClinicId::try_from(row.clinic_id)?,
            patient_id: row.patient_id.map(PatientId::try_from).transpose()?,
            package_id: row.package_id.map(PackageId::try_from).transpose()?,
            description: Description::new(row.description)?,
            category: row.category,
            amount: Money::from_cents(row.amount)?,
            due_date: row.due_date,
            paid_date: row.paid_date,
            payment_method: row.payment_method,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a ReceivableDetails> for UpdateReceivable<'a> {
    fn from(d: &'a ReceivableDetails) -> Self {
        Self {
            patient_id: d.patient_id.map(PatientId::get),
            description: d.description.as_str(),
            category: d.category.as_deref(),
            amount: d.amount.cents(),
            due_date: d.due_date,
            notes: d.notes.as_deref(),
        }
    }
}

impl<'a> NewReceivable<'a> {
    pub fn from_domain(receivable: &'a DomainNewReceivable, now: NaiveDateTime) -> Self {
        Self {
            clinic_id: receivable.clinic_id.get(),
            package_id: receivable.package_id.map(PackageId::get),
            details: (&receivable.details).into(),
            created_at: now,
        }
    }
}

impl<'a> From<Option<&'a Settlement>> for PayableSettlement<'a> {
    fn from(settlement: Option<&'a Settlement>) -> Self {
        Self {
            paid_date: settlement.map(|s| s.paid_date),
            payment_method: settlement.and_then(|s| s.payment_method.as_deref()),
        }
    }
}

impl<'a> From<Option<&'a Settlement>> for ReceivableSettlement<'a> {
    fn from(settlement: Option<&'a Settlement>) -> Self {
        Self {
            paid_date: settlement.map(|s| s.paid_date),
            payment_method: settlement.and_then(|s| s.payment_method.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::finance::PaymentStatus;

    #[test]
    fn receivable_row_into_domain_derives_status() {
        let due = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let row = Receivable {
            id: 1,
            clinic_id: 1,
            patient_id: Some(4),
            package_id: None,
            description: "Sessão".into(),
            category: Some("sessao".into()),
            amount: 15_000,
            due_date: due,
            paid_date: None,
            payment_method: None,
            notes: None,
            created_at: due.and_hms_opt(8, 0, 0).unwrap(),
        };
        let receivable = DomainReceivable::try_from(row).expect("valid receivable");
        assert_eq!(receivable.amount.cents(), 15_000);
        assert_eq!(
            receivable.status(NaiveDate::from_ymd_opt(2026, 2, 11).unwrap()),
            PaymentStatus::Overdue
        );
    }

    #[test]
    fn clearing_a_settlement_nulls_both_columns() {
        let cleared = PayableSettlement::from(None);
        assert_eq!(cleared.paid_date, None);
        assert_eq!(cleared.payment_method, None);

        let settlement = Settlement {
            paid_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            payment_method: Some("pix".into()),
        };
        let paid = ReceivableSettlement::from(Some(&settlement));
        assert_eq!(paid.payment_method, Some("pix"));
    }
}
