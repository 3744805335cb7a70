pub mod balance;
pub mod config;
pub mod decimal;
pub mod delinquency;
pub mod engine;
pub mod errors;
pub mod loan;
pub mod logging;
pub mod payments;
pub mod requests;
pub mod store;
pub mod time;
pub mod types;
pub mod views;

// re-export key types
pub use config::BillingConfig;
pub use decimal::{Amount, Currency, Rate};
pub use delinquency::{DelinquencyAssessment, DelinquencyEvaluator};
pub use engine::BillingEngine;
pub use errors::{BillingError, ErrorKind, ErrorResponse, Result};
pub use loan::{Loan, LoanSchedule, NewLoan};
pub use payments::{GeneratedLoan, PaymentRequest, ScheduleGenerator, Settlement};
pub use store::{InMemoryLoanStore, LoanStore, StoreError};
pub use types::{InstallmentStatus, LoanId, PaymentFrequency, ScheduleId};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
