//! Accounts payable and receivable.
//!
//! Payment status is not stored; listings filter on the payment and due
//! dates relative to [`FinanceFilter::today`].

use chrono::NaiveDate;
use diesel::prelude::*;

use crate::domain::finance::{
    FinanceFilter, NewPayable, NewReceivable, Payable, PayableDetails, PaymentStatus, Receivable,
    ReceivableDetails, Settlement,
};
use crate::domain::report::{EntryKind, PaidEntry};
use crate::domain::types::{ClinicId, Money, PayableId, ReceivableId};
use crate::models::finance::{
    NewPayable as DbNewPayable, NewReceivable as DbNewReceivable, Payable as DbPayable,
    PayableSettlement, Receivable as DbReceivable, ReceivableSettlement, UpdatePayable,
    UpdateReceivable,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, FinanceReader, FinanceWriter};
use crate::schema::{payables, receivables};

impl FinanceReader for DieselRepository {
    fn get_payable(&self, clinic_id: ClinicId, id: PayableId) -> RepositoryResult<Option<Payable>> {
        let mut conn = self.conn()?;
        let payable = payables::table
            .filter(payables::clinic_id.eq(clinic_id.get()))
            .filter(payables::id.eq(id.get()))
            .first::<DbPayable>(&mut conn)
            .optional()?;

        Ok(payable.map(Payable::try_from).transpose()?)
    }

    fn list_payables(
        &self,
        clinic_id: ClinicId,
        filter: &FinanceFilter,
    ) -> RepositoryResult<Vec<Payable>> {
        let mut conn = self.conn()?;
        let mut query = payables::table
            .filter(payables::clinic_id.eq(clinic_id.get()))
            .into_boxed();

        query = match filter.status {
            Some(PaymentStatus::Paid) => query.filter(payables::paid_date.is_not_null()),
            Some(PaymentStatus::Pending) => query
                .filter(payables::paid_date.is_null())
                .filter(payables::due_date.ge(filter.today)),
            Some(PaymentStatus::Overdue) => query
                .filter(payables::paid_date.is_null())
                .filter(payables::due_date.lt(filter.today)),
            None => query,
        };
        if let Some(from) = filter.due_from {
            query = query.filter(payables::due_date.ge(from));
        }
        if let Some(to) = filter.due_to {
            query = query.filter(payables::due_date.le(to));
        }
        if let Some(category) = &filter.category {
            query = query.filter(payables::category.eq(category.clone()));
        }

        let rows = query
            .order((payables::due_date.asc(), payables::id.asc()))
            .load::<DbPayable>(&mut conn)?;

        rows.into_iter()
            .map(|row| Payable::try_from(row).map_err(RepositoryError::from))
            .collect()
    }

    fn get_receivable(
        &self,
        clinic_id: ClinicId,
        id: ReceivableId,
    ) -> RepositoryResult<Option<Receivable>> {
        let mut conn = self.conn()?;
        let receivable = receivables::table
            .filter(receivables::clinic_id.eq(clinic_id.get()))
            .filter(receivables::id.eq(id.get()))
            .first::<DbReceivable>(&mut conn)
            .optional()?;

        Ok(receivable.map(Receivable::try_from).transpose()?)
    }

    fn list_receivables(
        &self,
        clinic_id: ClinicId,
        filter: &FinanceFilter,
    ) -> RepositoryResult<Vec<Receivable>> {
        let mut conn = self.conn()?;
        let mut query = receivables::table
            .filter(receivables::clinic_id.eq(clinic_id.get()))
            .into_boxed();

        query = match filter.status {
            Some(PaymentStatus::Paid) => query.filter(receivables::paid_date.is_not_null()),
            Some(PaymentStatus::Pending) => query
                .filter(receivables::paid_date.is_null())
                .filter(receivables::due_date.ge(filter.today)),
            Some(PaymentStatus::Overdue) => query
                .filter(receivables::paid_date.is_null())
                .filter(receivables::due_date.lt(filter.today)),
            None => query,
        };
        if let Some(from) = filter.due_from {
            query = query.filter(receivables::due_date.ge(from));
        }
        if let Some(to) = filter.due_to {
            query = query.filter(receivables::due_date.le(to));
        }
        if let Some(category) = &filter.category {
            query = query.filter(receivables::category.eq(category.clone()));
        }
        if let Some(patient_id) = filter.patient_id {
            query = query.filter(receivables::patient_id.eq(patient_id.get()));
        }

        let rows = query
            .order((receivables::due_date.asc(), receivables::id.asc()))
            .load::<DbReceivable>(&mut conn)?;

        rows.into_iter()
            .map(|row| Receivable::try_from(row).map_err(RepositoryError::from))
            .collect()
    }

    fn list_paid_entries(
        &self,
        clinic_id: ClinicId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<PaidEntry>> {
        let mut conn = self.conn()?;

        let income = receivables::table
            .filter(receivables::clinic_id.eq(clinic_id.get()))
            .filter(receivables::paid_date.ge(from))
            .filter(receivables::paid_date.le(to))
            .select((
                receivables::paid_date,
                receivables::description,
                receivables::category,
                receivables::amount,
            ))
            .load::<(Option<NaiveDate>, String, Option<String>, i64)>(&mut conn)?;

        let expenses = payables::table
            .filter(payables::clinic_id.eq(clinic_id.get()))
            .filter(payables::paid_date.ge(from))
            .filter(payables::paid_date.le(to))
            .select((
                payables::paid_date,
                payables::description,
                payables::category,
                payables::amount,
            ))
            .load::<(Option<NaiveDate>, String, Option<String>, i64)>(&mut conn)?;

        let tagged = income
            .into_iter()
            .map(|row| (EntryKind::Income, row))
            .chain(expenses.into_iter().map(|row| (EntryKind::Expense, row)));

        let mut entries = Vec::new();
        for (kind, (paid_date, description, category, amount)) in tagged {
            let Some(date) = paid_date else { continue };
            entries.push(PaidEntry {
                date,
                kind,
                description,
                category,
                amount: Money::from_cents(amount)?,
            });
        }
        entries.sort_by_key(|entry| entry.date);

        Ok(entries)
    }
}

impl FinanceWriter for DieselRepository {
    fn create_payable(&self, payable: &NewPayable) -> RepositoryResult<Payable> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(payables::table)
            .values(&DbNewPayable::from_domain(payable, super::now()))
            .get_result::<DbPayable>(&mut conn)?;

        Ok(Payable::try_from(created)?)
    }

    fn update_payable(
        &self,
        clinic_id: ClinicId,
        id: PayableId,
        details: &PayableDetails,
    ) -> RepositoryResult<Payable> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            payables::table
                .filter(payables::clinic_id.eq(clinic_id.get()))
                .filter(payables::id.eq(id.get())),
        )
        .set(&UpdatePayable::from(details))
        .get_result::<DbPayable>(&mut conn)?;

        Ok(Payable::try_from(updated)?)
    }

    fn settle_payable(
        &self,
        clinic_id: ClinicId,
        id: PayableId,
        settlement: Option<&Settlement>,
    ) -> RepositoryResult<Payable> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            payables::table
                .filter(payables::clinic_id.eq(clinic_id.get()))
                .filter(payables::id.eq(id.get())),
        )
        .set(&PayableSettlement::from(settlement))
        .get_result::<DbPayable>(&mut conn)?;

        Ok(Payable::try_from(updated)?)
    }

    fn delete_payable(&self, clinic_id: ClinicId, id: PayableId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            payables::table
                .filter(payables::clinic_id.eq(clinic_id.get()))
                .filter(payables::id.eq(id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn create_receivable(&self, receivable: &NewReceivable) -> RepositoryResult<Receivable> {
        let mut conn = self.conn()?;
        let created = diesel::insert_into(receivables::table)
            .values(&DbNewReceivable::from_domain(receivable, super::now()))
            .get_result::<DbReceivable>(&mut conn)?;

        Ok(Receivable::try_from(created)?)
    }

    fn update_receivable(
        &self,
        clinic_id: ClinicId,
        id: ReceivableId,
        details: &ReceivableDetails,
    ) -> RepositoryResult<Receivable> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            receivables::table
                .filter(receivables::clinic_id.eq(clinic_id.get()))
                .filter(receivables::id.eq(id.get())),
        )
        .set(&UpdateReceivable::from(details))
        .get_result::<DbReceivable>(&mut conn)?;

        Ok(Receivable::try_from(updated)?)
    }

    fn settle_receivable(
        &self,
        clinic_id: ClinicId,
        id: ReceivableId,
        settlement: Option<&Settlement>,
    ) -> RepositoryResult<Receivable> {
        let mut conn = self.conn()?;
        let updated = diesel::update(
            receivables::table
                .filter(receivables::clinic_id.eq(clinic_id.get()))
                .filter(receivables::id.eq(id.get())),
        )
        .set(&ReceivableSettlement::from(settlement))
        .get_result::<DbReceivable>(&mut conn)?;

        Ok(Receivable::try_from(updated)?)
    }

    fn delete_receivable(&self, clinic_id: ClinicId, id: ReceivableId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            receivables::table
                .filter(receivables::clinic_id.eq(clinic_id.get()))
                .filter(receivables::id.eq(id.get())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
