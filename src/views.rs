//! Serializable views handed to the transport layer.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::delinquency::DelinquencyAssessment;
use crate::loan::{Loan, LoanSchedule};
use crate::types::{InstallmentStatus, LoanId, PaymentFrequency};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn local_date(at: &DateTime<FixedOffset>, offset: &FixedOffset) -> String {
    at.with_timezone(offset).format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub borrower_id: String,
    pub principal_amount: f64,
    pub interest_rate: f64,
    pub started_at: String,
    pub ended_at: String,
    pub payment_frequency: PaymentFrequency,
    pub total_payments: u32,
}

impl LoanView {
    pub fn from_loan(loan: &Loan, offset: &FixedOffset) -> Self {
        LoanView {
            id: loan.id,
            borrower_id: loan.borrower_id.clone(),
            principal_amount: loan.principal_amount.to_f64(),
            interest_rate: loan.interest_rate.to_f64(),
            started_at: local_date(&loan.started_at, offset),
            ended_at: local_date(&loan.ended_at, offset),
            payment_frequency: loan.payment_frequency,
            total_payments: loan.total_payments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutstandingLoan {
    pub id: LoanId,
    pub outstanding_amount: String,
}

impl OutstandingLoan {
    pub fn new(id: LoanId, amount: &Amount) -> Self {
        Self {
            id,
            outstanding_amount: amount.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingLoan {
    pub id: LoanId,
    pub pending_amount: String,
}

impl PendingLoan {
    pub fn new(id: LoanId, amount: &Amount) -> Self {
        Self {
            id,
            pending_amount: amount.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelinquencyView {
    pub loan_id: LoanId,
    pub is_delinquent: bool,
}

impl DelinquencyView {
    pub fn new(loan_id: LoanId, assessment: &DelinquencyAssessment) -> Self {
        Self {
            loan_id,
            is_delinquent: assessment.delinquent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleView {
    pub sequence: u32,
    pub due_date: String,
    pub amount_due: String,
    pub status: InstallmentStatus,
}

impl ScheduleView {
    pub fn from_schedule(row: &LoanSchedule, offset: &FixedOffset) -> Self {
        Self {
            sequence: row.sequence,
            due_date: local_date(&row.due_date, offset),
            amount_due: row.amount_due.to_string(),
            status: row.status,
        }
    }
}

/// body for operations with nothing else to report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessView {
    pub status: String,
}

impl Default for SuccessView {
    fn default() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}
