use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::finance::{FinanceFilter, FinanceSummary, Payable, PaymentStatus, Receivable};
use crate::domain::types::{PatientId, TypeConstraintError, clean_optional};

/// Listing filters accepted by the payable and receivable endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct FinanceQuery {
    pub status: Option<PaymentStatus>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    pub category: Option<String>,
    /// Ignored for payables.
    pub patient_id: Option<i32>,
}

impl FinanceQuery {
    pub fn into_filter(self, today: NaiveDate) -> Result<FinanceFilter, TypeConstraintError> {
        Ok(FinanceFilter {
            today,
            status: self.status,
            due_from: self.due_from,
            due_to: self.due_to,
            category: clean_optional(self.category),
            patient_id: self.patient_id.map(PatientId::new).transpose()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PayableView {
    #[serde(flatten)]
    pub payable: Payable,
    pub status: PaymentStatus,
}

impl PayableView {
    pub fn new(payable: Payable, today: NaiveDate) -> Self {
        Self {
            status: payable.status(today),
            payable,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReceivableView {
    #[serde(flatten)]
    pub receivable: Receivable,
    pub status: PaymentStatus,
}

impl ReceivableView {
    pub fn new(receivable: Receivable, today: NaiveDate) -> Self {
        Self {
            status: receivable.status(today),
            receivable,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct FinanceOverview {
    pub payables: FinanceSummary,
    pub receivables: FinanceSummary,
}
