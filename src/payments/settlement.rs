use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::errors::{BillingError, Result};
use crate::store::{require_loan, LoanStore};
use crate::types::LoanId;

/// receipt for an accepted payment; not persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub loan_id: LoanId,
    pub amount_paid: Amount,
    pub installments_paid: usize,
    pub settled_at: DateTime<FixedOffset>,
}

/// Settle `amount` against the pending total of a loan as of `as_of`.
///
/// Only an exact match is accepted. Callers must serialize calls per loan; see
/// [`LoanLocks`](super::LoanLocks).
pub fn settle<S: LoanStore + ?Sized>(
    store: &S,
    loan_id: LoanId,
    amount: Amount,
    as_of: DateTime<FixedOffset>,
) -> Result<Settlement> {
    if !amount.is_positive() {
        return Err(BillingError::Validation {
            message: "amount is required and must be greater than 0".to_string(),
        });
    }

    let loan = require_loan(store, loan_id)?;
    let pending = store.get_total_pending(loan.id, as_of)?;

    if !amount.equal_to(&pending)? {
        return Err(BillingError::PaymentAmountMismatch {
            submitted: amount,
            pending,
        });
    }

    let installments_paid = store.mark_pending_as_paid(loan.id, as_of)?;
    if installments_paid == 0 {
        return Err(BillingError::SettlementConflict { id: loan.id });
    }

    Ok(Settlement {
        loan_id: loan.id,
        amount_paid: amount,
        installments_paid,
        settled_at: as_of,
    })
}
