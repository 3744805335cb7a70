pub mod lock;
pub mod schedule;
pub mod settlement;

use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::types::LoanId;

pub use lock::LoanLocks;
pub use schedule::{GeneratedLoan, ScheduleGenerator};
pub use settlement::{settle, Settlement};

/// payment request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub loan_id: LoanId,
    pub amount: Amount,
}
