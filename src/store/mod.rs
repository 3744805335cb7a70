//! Persistence contract consumed by the billing engine.

pub mod memory;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::decimal::Amount;
use crate::errors::{BillingError, Result};
use crate::loan::{Loan, LoanSchedule};
use crate::types::LoanId;

pub use memory::InMemoryLoanStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("loan already exists: {id}")]
    DuplicateLoan { id: LoanId },

    #[error("invalid schedule for loan {id}: {message}")]
    InvalidSchedule { id: LoanId, message: String },

    #[error("corrupt record: {message}")]
    Corrupt { message: String },

    #[error("storage backend failure: {message}")]
    Backend { message: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage operations the billing engine relies on.
///
/// Implementations must make `create_loan` and `mark_pending_as_paid` atomic, and must select
/// pending rows for `get_total_pending` and `mark_pending_as_paid` with the same predicate
/// (see [`LoanSchedule::is_pending`]).
#[cfg_attr(test, mockall::automock)]
pub trait LoanStore: Send + Sync {
    /// persist a loan together with its full schedule, or nothing
    fn create_loan(&self, loan: &Loan, schedule: &[LoanSchedule]) -> StoreResult<()>;

    fn get_loan_by_id(&self, id: LoanId) -> StoreResult<Option<Loan>>;

    /// installments ordered by sequence
    fn get_schedules(&self, id: LoanId) -> StoreResult<Vec<LoanSchedule>>;

    /// sum of all unpaid installments
    fn get_outstanding(&self, id: LoanId) -> StoreResult<Amount>;

    /// sum of unpaid installments due before `as_of`
    fn get_total_pending(&self, id: LoanId, as_of: DateTime<FixedOffset>) -> StoreResult<Amount>;

    /// due dates of unpaid installments, ascending
    fn get_unpaid_due_dates(&self, id: LoanId) -> StoreResult<Vec<DateTime<FixedOffset>>>;

    /// mark every pending installment paid; returns the number of rows changed
    fn mark_pending_as_paid(&self, id: LoanId, as_of: DateTime<FixedOffset>) -> StoreResult<usize>;
}

/// Load a loan or fail with `LoanNotFound`. Every engine operation starts here.
pub fn require_loan<S: LoanStore + ?Sized>(store: &S, id: LoanId) -> Result<Loan> {
    store
        .get_loan_by_id(id)?
        .ok_or(BillingError::LoanNotFound { id })
}
