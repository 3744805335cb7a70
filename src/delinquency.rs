use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::store::{require_loan, LoanStore};
use crate::types::LoanId;

/// missed periods a loan may carry before it counts as delinquent
pub const DEFAULT_DELINQUENCY_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelinquencyAssessment {
    pub missed_periods: u32,
    pub threshold: u32,
    pub delinquent: bool,
}

/// Count leading due dates strictly before `now`.
///
/// `due_dates` must be the unpaid installments in ascending order, so missed periods are always
/// a prefix and counting stops at the first date that has not passed.
pub fn count_missed_periods(due_dates: &[DateTime<FixedOffset>], now: DateTime<FixedOffset>) -> u32 {
    due_dates.iter().take_while(|due| **due < now).count() as u32
}

#[derive(Debug, Clone, Copy)]
pub struct DelinquencyEvaluator {
    threshold: u32,
}

impl Default for DelinquencyEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_DELINQUENCY_THRESHOLD)
    }
}

impl DelinquencyEvaluator {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// delinquent iff missed periods exceed the threshold
    pub fn evaluate(
        &self,
        due_dates: &[DateTime<FixedOffset>],
        now: DateTime<FixedOffset>,
    ) -> DelinquencyAssessment {
        let missed_periods = count_missed_periods(due_dates, now);
        DelinquencyAssessment {
            missed_periods,
            threshold: self.threshold,
            delinquent: missed_periods > self.threshold,
        }
    }

    /// assess an existing loan from its unpaid installments
    pub fn assess<S: LoanStore + ?Sized>(
        &self,
        store: &S,
        loan_id: LoanId,
        now: DateTime<FixedOffset>,
    ) -> Result<DelinquencyAssessment> {
        require_loan(store, loan_id)?;
        let due_dates = store.get_unpaid_due_dates(loan_id)?;
        Ok(self.evaluate(&due_dates, now))
    }
}
