use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::decimal::{Amount, Rate};
use crate::errors::{BillingError, Result};
use crate::types::{InstallmentStatus, LoanId, PaymentFrequency, ScheduleId};

/// validated origination input
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub borrower_id: String,
    pub principal_amount: Amount,
    pub interest_rate: Rate,
    pub payment_frequency: PaymentFrequency,
    pub total_payments: u32,
}

impl NewLoan {
    pub fn validate(&self) -> Result<()> {
        if self.borrower_id.trim().is_empty() {
            return Err(BillingError::Validation {
                message: "borrower_id is required".to_string(),
            });
        }
        if !self.principal_amount.is_positive() {
            return Err(BillingError::Validation {
                message: "principal_amount is required and must be greater than 0".to_string(),
            });
        }
        if !self.interest_rate.is_positive() {
            return Err(BillingError::Validation {
                message: "interest_rate is required and must be greater than 0".to_string(),
            });
        }
        if self.total_payments == 0 {
            return Err(BillingError::Validation {
                message: "total_payments is required and must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// originated loan; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub borrower_id: String,
    pub principal_amount: Amount,
    pub interest_rate: Rate,
    pub started_at: DateTime<FixedOffset>,
    pub ended_at: DateTime<FixedOffset>,
    pub payment_frequency: PaymentFrequency,
    pub total_payments: u32,

    // derived at origination
    pub loan_term_days: u32,
    pub installment_amount: Amount,
}

/// one installment of a loan's schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanSchedule {
    pub id: ScheduleId,
    pub loan_id: LoanId,
    pub sequence: u32,
    pub due_date: DateTime<FixedOffset>,
    pub amount_due: Amount,
    pub status: InstallmentStatus,
}

impl LoanSchedule {
    pub fn is_unpaid(&self) -> bool {
        self.status == InstallmentStatus::Unpaid
    }

    /// Unpaid and due strictly before `as_of`.
    ///
    /// Both the pending total and the bulk mark-paid select rows with this predicate.
    pub fn is_pending(&self, as_of: DateTime<FixedOffset>) -> bool {
        self.is_unpaid() && self.due_date < as_of
    }

    pub fn mark_paid(&mut self) {
        self.status = InstallmentStatus::Paid;
    }
}
