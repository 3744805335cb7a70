use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, FixedOffset};

use crate::balance;
use crate::decimal::Amount;
use crate::loan::{Loan, LoanSchedule};
use crate::types::LoanId;

use super::{LoanStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    loans: HashMap<LoanId, Loan>,
    schedules: HashMap<LoanId, Vec<LoanSchedule>>,
}

/// Process-local store. A single lock covers both tables, so creation and bulk updates are
/// all-or-nothing.
#[derive(Debug, Default)]
pub struct InMemoryLoanStore {
    tables: RwLock<Tables>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loan_count(&self) -> StoreResult<usize> {
        Ok(self.read()?.loans.len())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables.read().map_err(|_| StoreError::Backend {
            message: "loan tables lock poisoned".to_string(),
        })
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables.write().map_err(|_| StoreError::Backend {
            message: "loan tables lock poisoned".to_string(),
        })
    }

    fn with_schedule<T>(
        &self,
        id: LoanId,
        f: impl FnOnce(&Loan, &[LoanSchedule]) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let tables = self.read()?;
        let loan = tables.loans.get(&id).ok_or_else(|| StoreError::Corrupt {
            message: format!("no loan row for {id}"),
        })?;
        let schedule = tables.schedules.get(&id).map(Vec::as_slice).unwrap_or(&[]);
        f(loan, schedule)
    }
}

fn check_schedule(loan: &Loan, schedule: &[LoanSchedule]) -> StoreResult<()> {
    let invalid = |message: String| StoreError::InvalidSchedule {
        id: loan.id,
        message,
    };

    if schedule.len() != loan.total_payments as usize {
        return Err(invalid(format!(
            "expected {} installments, got {}",
            loan.total_payments,
            schedule.len()
        )));
    }
    for (index, row) in schedule.iter().enumerate() {
        if row.loan_id != loan.id {
            return Err(invalid(format!("installment {} belongs to {}", row.id, row.loan_id)));
        }
        if row.sequence as usize != index + 1 {
            return Err(invalid(format!(
                "sequence {} at position {}",
                row.sequence,
                index + 1
            )));
        }
    }
    if schedule.windows(2).any(|pair| pair[0].due_date > pair[1].due_date) {
        return Err(invalid("due dates decrease".to_string()));
    }
    Ok(())
}

fn corrupt(err: crate::errors::BillingError) -> StoreError {
    StoreError::Corrupt {
        message: err.to_string(),
    }
}

impl LoanStore for InMemoryLoanStore {
    fn create_loan(&self, loan: &Loan, schedule: &[LoanSchedule]) -> StoreResult<()> {
        check_schedule(loan, schedule)?;

        let mut tables = self.write()?;
        if tables.loans.contains_key(&loan.id) {
            return Err(StoreError::DuplicateLoan { id: loan.id });
        }
        tables.loans.insert(loan.id, loan.clone());
        tables.schedules.insert(loan.id, schedule.to_vec());
        Ok(())
    }

    fn get_loan_by_id(&self, id: LoanId) -> StoreResult<Option<Loan>> {
        Ok(self.read()?.loans.get(&id).cloned())
    }

    fn get_schedules(&self, id: LoanId) -> StoreResult<Vec<LoanSchedule>> {
        Ok(self.read()?.schedules.get(&id).cloned().unwrap_or_default())
    }

    fn get_outstanding(&self, id: LoanId) -> StoreResult<Amount> {
        self.with_schedule(id, |loan, schedule| {
            balance::outstanding_total(schedule, loan.installment_amount.currency()).map_err(corrupt)
        })
    }

    fn get_total_pending(&self, id: LoanId, as_of: DateTime<FixedOffset>) -> StoreResult<Amount> {
        self.with_schedule(id, |loan, schedule| {
            balance::pending_total(schedule, loan.installment_amount.currency(), as_of)
                .map_err(corrupt)
        })
    }

    fn get_unpaid_due_dates(&self, id: LoanId) -> StoreResult<Vec<DateTime<FixedOffset>>> {
        self.with_schedule(id, |_, schedule| {
            let mut due_dates: Vec<_> = schedule
                .iter()
                .filter(|row| row.is_unpaid())
                .map(|row| row.due_date)
                .collect();
            due_dates.sort();
            Ok(due_dates)
        })
    }

    fn mark_pending_as_paid(&self, id: LoanId, as_of: DateTime<FixedOffset>) -> StoreResult<usize> {
        let mut tables = self.write()?;
        let Some(schedule) = tables.schedules.get_mut(&id) else {
            return Ok(0);
        };

        let mut marked = 0;
        for row in schedule.iter_mut().filter(|row| row.is_pending(as_of)) {
            row.mark_paid();
            marked += 1;
        }
        Ok(marked)
    }
}
