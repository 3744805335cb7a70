//! Validation of inbound payloads before they reach the engine.

use serde::Deserialize;
use serde_json::error::Category;
use uuid::Uuid;

use crate::decimal::{Amount, Currency, Rate};
use crate::errors::{BillingError, Result};
use crate::loan::NewLoan;
use crate::payments::PaymentRequest;
use crate::types::{LoanId, PaymentFrequency};

/// parse a loan identifier taken from a path or payload
pub fn parse_loan_id(raw: &str) -> Result<LoanId> {
    Uuid::parse_str(raw.trim()).map_err(|_| BillingError::InvalidIdentifier {
        value: raw.to_string(),
    })
}

fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        Category::Syntax | Category::Eof => BillingError::UnprocessableContent {
            message: "Invalid json.".to_string(),
        },
        Category::Data | Category::Io => BillingError::Validation {
            message: e.to_string(),
        },
    })
}

fn required(message: &str) -> BillingError {
    BillingError::Validation {
        message: message.to_string(),
    }
}

/// loan origination payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateLoanRequest {
    pub borrower_id: Option<String>,
    pub principal_amount: Option<f64>,
    pub interest_rate: Option<f64>,
    pub payment_frequency: Option<String>,
    pub total_payments: Option<i64>,
}

impl CreateLoanRequest {
    pub fn from_json(body: &[u8]) -> Result<NewLoan> {
        decode::<Self>(body)?.into_new_loan(Currency::default())
    }

    pub fn into_new_loan(self, currency: Currency) -> Result<NewLoan> {
        let borrower_id = self
            .borrower_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| required("borrower_id is required"))?;

        let principal = self
            .principal_amount
            .filter(|p| *p > 0.0)
            .ok_or_else(|| required("principal_amount is required and must be greater than 0"))?;

        let interest_rate = self
            .interest_rate
            .filter(|r| *r > 0.0)
            .ok_or_else(|| required("interest_rate is required and must be greater than 0"))?;

        let frequency = self
            .payment_frequency
            .ok_or_else(|| required("payment_frequency is required"))?;
        let payment_frequency = frequency.parse::<PaymentFrequency>().map_err(|_| {
            let known: Vec<&str> = PaymentFrequency::ALL.iter().map(|f| f.as_str()).collect();
            BillingError::Validation {
                message: format!("payment_frequency should be one of {known:?}"),
            }
        })?;

        let total_payments = self
            .total_payments
            .filter(|n| *n > 0)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| required("total_payments is required and must be greater than 0"))?;

        let new_loan = NewLoan {
            borrower_id,
            principal_amount: Amount::new_in(principal, currency)?,
            interest_rate: Rate::from_f64(interest_rate)?,
            payment_frequency,
            total_payments,
        };
        new_loan.validate()?;
        Ok(new_loan)
    }
}

/// payment payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayLoanRequest {
    pub id: Option<String>,
    pub amount: Option<f64>,
}

impl PayLoanRequest {
    pub fn from_json(body: &[u8]) -> Result<PaymentRequest> {
        decode::<Self>(body)?.into_payment(Currency::default())
    }

    pub fn into_payment(self, currency: Currency) -> Result<PaymentRequest> {
        let raw_id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| required("id is required"))?;

        let amount = self
            .amount
            .filter(|a| *a > 0.0)
            .ok_or_else(|| required("amount is required and must be greater than 0"))?;

        Ok(PaymentRequest {
            loan_id: parse_loan_id(&raw_id)?,
            amount: Amount::new_in(amount, currency)?,
        })
    }
}
