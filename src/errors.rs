use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decimal::{Amount, Currency};
use crate::store::StoreError;
use crate::types::LoanId;

/// message shown to clients for any server-side failure
pub const GENERIC_SERVER_MESSAGE: &str = "Something went wrong, please try again later.";

/// closed set of error kinds the boundary layer matches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    UnprocessableContent,
    InvalidIdentifier,
    LoanNotFound,
    PaymentAmountMismatch,
    ServerError,
}

impl ErrorKind {
    /// stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::UnprocessableContent => "UNPROCESSABLE_CONTENT_ERROR",
            ErrorKind::InvalidIdentifier => "INVALID_UUID",
            ErrorKind::LoanNotFound => "LOAN_NOT_FOUND",
            ErrorKind::PaymentAmountMismatch => "PAYMENT_AMOUNT_MISMATCH",
            ErrorKind::ServerError => "SERVER_ERROR",
        }
    }
}

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("{message}")]
    Validation {
        message: String,
    },

    #[error("amounts need to have the same currency: {left} vs {right}")]
    CurrencyMismatch {
        left: Currency,
        right: Currency,
    },

    #[error("{message}")]
    UnprocessableContent {
        message: String,
    },

    #[error("UUID provided is invalid: {value}")]
    InvalidIdentifier {
        value: String,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("payment amount {submitted} is not equal to pending amount {pending}")]
    PaymentAmountMismatch {
        submitted: Amount,
        pending: Amount,
    },

    #[error("pending installments for loan {id} changed during settlement")]
    SettlementConflict {
        id: LoanId,
    },

    #[error("unsupported payment frequency: {frequency}")]
    UnsupportedFrequency {
        frequency: String,
    },

    #[error("calculation error: {message}")]
    Calculation {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl BillingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::Validation { .. }
            | BillingError::CurrencyMismatch { .. }
            | BillingError::UnsupportedFrequency { .. } => ErrorKind::Validation,
            BillingError::UnprocessableContent { .. } => ErrorKind::UnprocessableContent,
            BillingError::InvalidIdentifier { .. } => ErrorKind::InvalidIdentifier,
            BillingError::LoanNotFound { .. } => ErrorKind::LoanNotFound,
            BillingError::PaymentAmountMismatch { .. } | BillingError::SettlementConflict { .. } => {
                ErrorKind::PaymentAmountMismatch
            }
            BillingError::Calculation { .. }
            | BillingError::InvalidConfiguration { .. }
            | BillingError::Storage(_) => ErrorKind::ServerError,
        }
    }

    /// client-facing http status
    pub fn status(&self) -> u16 {
        match self {
            BillingError::CurrencyMismatch { .. } => 422,
            _ => match self.kind() {
                ErrorKind::Validation
                | ErrorKind::InvalidIdentifier
                | ErrorKind::LoanNotFound
                | ErrorKind::PaymentAmountMismatch => 400,
                ErrorKind::UnprocessableContent => 422,
                ErrorKind::ServerError => 500,
            },
        }
    }

    /// Build the client envelope. Server-kind details stay in the logs.
    pub fn to_response(&self) -> ErrorResponse {
        let kind = self.kind();
        let message = match (kind, self) {
            (ErrorKind::ServerError, _) => {
                tracing::error!(error = %self, "unexpected billing failure");
                GENERIC_SERVER_MESSAGE.to_string()
            }
            (_, BillingError::InvalidIdentifier { .. }) => "UUID provided is invalid".to_string(),
            (_, BillingError::LoanNotFound { .. }) => "Loan not found".to_string(),
            (_, BillingError::PaymentAmountMismatch { .. }) => {
                "Payment amount is not equal to pending amount".to_string()
            }
            _ => self.to_string(),
        };

        ErrorResponse {
            error_code: kind.code().to_string(),
            message,
            status: self.status(),
        }
    }
}

/// error envelope handed to the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_code: String,
    pub message: String,
    #[serde(skip)]
    pub status: u16,
}

pub type Result<T> = std::result::Result<T, BillingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_kinds_and_statuses() {
        let not_found = BillingError::LoanNotFound { id: Uuid::new_v4() };
        assert_eq!(not_found.kind(), ErrorKind::LoanNotFound);
        assert_eq!(not_found.status(), 400);

        let currency = BillingError::CurrencyMismatch {
            left: Currency::Idr,
            right: Currency::Idr,
        };
        assert_eq!(currency.kind(), ErrorKind::Validation);
        assert_eq!(currency.status(), 422);

        let storage = BillingError::from(StoreError::Backend {
            message: "connection reset".to_string(),
        });
        assert_eq!(storage.kind(), ErrorKind::ServerError);
        assert_eq!(storage.status(), 500);
    }

    #[test]
    fn test_server_errors_are_opaque() {
        let err = BillingError::from(StoreError::Backend {
            message: "password authentication failed".to_string(),
        });
        let response = err.to_response();
        assert_eq!(response.error_code, "SERVER_ERROR");
        assert_eq!(response.message, GENERIC_SERVER_MESSAGE);
        assert_eq!(response.status, 500);
    }

    #[test]
    fn test_client_errors_keep_detail() {
        let err = BillingError::Validation {
            message: "borrower_id is required".to_string(),
        };
        let response = err.to_response();
        assert_eq!(response.error_code, "VALIDATION_ERROR");
        assert_eq!(response.message, "borrower_id is required");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"error_code": "VALIDATION_ERROR", "message": "borrower_id is required"})
        );
    }

    #[test]
    fn test_settlement_conflict_is_mismatch_kind() {
        let err = BillingError::SettlementConflict { id: Uuid::new_v4() };
        assert_eq!(err.kind().code(), "PAYMENT_AMOUNT_MISMATCH");
    }
}
