use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::domain::finance::{PayableDetails, ReceivableDetails, Settlement};
use crate::domain::types::{Description, Money, PatientId, clean_optional};
use crate::forms::FormError;

#[derive(Deserialize, Validate)]
pub struct PayableForm {
    #[validate(length(min = 1, max = 300))]
    pub description: String,
    pub supplier: Option<String>,
    pub category: Option<String>,
    /// Decimal amount such as `150,50`.
    pub amount: String,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

impl TryFrom<PayableForm> for PayableDetails {
    type Error = FormError;

    fn try_from(form: PayableForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(PayableDetails {
            description: Description::new(form.description)?,
            supplier: clean_optional(form.supplier),
            category: clean_optional(form.category),
            amount: form.amount.parse::<Money>()?,
            due_date: form.due_date,
            notes: clean_optional(form.notes),
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct ReceivableForm {
    pub patient_id: Option<i32>,
    #[validate(length(min = 1, max = 300))]
    pub description: String,
    pub category: Option<String>,
    pub amount: String,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
}

impl TryFrom<ReceivableForm> for ReceivableDetails {
    type Error = FormError;

    fn try_from(form: ReceivableForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(ReceivableDetails {
            patient_id: form.patient_id.map(PatientId::new).transpose()?,
            description: Description::new(form.description)?,
            category: clean_optional(form.category),
            amount: form.amount.parse::<Money>()?,
            due_date: form.due_date,
            notes: clean_optional(form.notes),
        })
    }
}

#[derive(Deserialize, Default)]
pub struct SettlementForm {
    /// Defaults to today.
    pub paid_date: Option<NaiveDate>,
    pub payment_method: Option<String>,
}

impl SettlementForm {
    pub fn into_settlement(self, today: NaiveDate) -> Settlement {
        Settlement {
            paid_date: self.paid_date.unwrap_or(today),
            payment_method: clean_optional(self.payment_method),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn due() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn payable_amount_accepts_brazilian_format() {
        let details = PayableDetails::try_from(PayableForm {
            description: "Aluguel".into(),
            supplier: None,
            category: Some("aluguel".into()),
            amount: "2.500,00".into(),
            due_date: due(),
            notes: None,
        })
        .unwrap();
        assert_eq!(details.amount.cents(), 250_000);
    }

    #[test]
    fn receivable_rejects_negative_amount() {
        let form = ReceivableForm {
            patient_id: Some(1),
            description: "Sessão".into(),
            category: None,
            amount: "-10".into(),
            due_date: due(),
            notes: None,
        };
        assert!(matches!(
            ReceivableDetails::try_from(form),
            Err(FormError::InvalidAmount)
        ));
    }

    #[test]
    fn settlement_defaults_to_today() {
        let settlement = SettlementForm::default().into_settlement(due());
        assert_eq!(settlement.paid_date, due());
        assert_eq!(settlement.payment_method, None);
    }
}
