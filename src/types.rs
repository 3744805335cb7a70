use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{BillingError, Result};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a single installment row
pub type ScheduleId = Uuid;

/// payment frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentFrequency {
    Weekly,
}

impl PaymentFrequency {
    pub const ALL: [PaymentFrequency; 1] = [PaymentFrequency::Weekly];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentFrequency::Weekly => "weekly",
        }
    }

    /// days covered by one payment period
    pub fn days_per_period(&self) -> u32 {
        match self {
            PaymentFrequency::Weekly => 7,
        }
    }
}

impl fmt::Display for PaymentFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentFrequency {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        PaymentFrequency::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BillingError::UnsupportedFrequency {
                frequency: s.to_string(),
            })
    }
}

/// installment status; transitions only from unpaid to paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    #[default]
    Unpaid,
    Paid,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Unpaid => "unpaid",
            InstallmentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
