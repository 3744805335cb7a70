use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::{BillingError, Result};
use crate::types::LoanId;

/// Per-loan mutexes serializing the read-compare-mark sequence of settlement.
#[derive(Debug, Default)]
pub struct LoanLocks {
    locks: Mutex<HashMap<LoanId, Arc<Mutex<()>>>>,
}

impl LoanLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `loan_id`. The entry is dropped once no caller holds it.
    pub fn with_lock<T>(&self, loan_id: LoanId, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.lock_for(loan_id)?;
        let result = {
            // a panic in another settlement leaves no partial state behind the guard
            let _guard: MutexGuard<'_, ()> = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(loan_id, &lock);
        result
    }

    fn release(&self, loan_id: LoanId, lock: &Arc<Mutex<()>>) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        // one reference in the registry, one held by this caller
        if Arc::strong_count(lock) == 2 {
            locks.remove(&loan_id);
        }
    }

    fn lock_for(&self, loan_id: LoanId) -> Result<Arc<Mutex<()>>> {
        let mut locks = self.locks.lock().map_err(|_| BillingError::Calculation {
            message: "settlement lock registry poisoned".to_string(),
        })?;
        Ok(Arc::clone(locks.entry(loan_id).or_default()))
    }

    pub fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
