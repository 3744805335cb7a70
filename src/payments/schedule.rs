use chrono::{DateTime, Duration, FixedOffset};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::decimal::{Amount, Rate};
use crate::errors::{BillingError, Result};
use crate::loan::{Loan, LoanSchedule, NewLoan};
use crate::types::{InstallmentStatus, PaymentFrequency};

/// loan plus the installments generated for it
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedLoan {
    pub loan: Loan,
    pub schedule: Vec<LoanSchedule>,
}

impl GeneratedLoan {
    /// sum of every installment's amount due
    pub fn total_due(&self) -> Result<Amount> {
        self.schedule.iter().try_fold(
            Amount::zero(self.loan.installment_amount.currency()),
            |acc, row| acc.checked_add(&row.amount_due),
        )
    }
}

/// Builds a loan and its installment rows.
///
/// Interest is simple: `principal * (1 + rate)` is charged once over the whole term and split
/// evenly across installments.
pub struct ScheduleGenerator;

impl ScheduleGenerator {
    pub fn generate(new_loan: &NewLoan, started_at: DateTime<FixedOffset>) -> Result<GeneratedLoan> {
        new_loan.validate()?;

        let total_payments = new_loan.total_payments;
        let installment_amount = calculate_installment_amount(
            new_loan.principal_amount,
            new_loan.interest_rate,
            total_payments,
        )?;
        let loan_term_days = loan_term_days(new_loan.payment_frequency, total_payments)?;
        let ended_at = add_days(started_at, u64::from(loan_term_days))?;

        let loan = Loan {
            id: Uuid::new_v4(),
            borrower_id: new_loan.borrower_id.clone(),
            principal_amount: new_loan.principal_amount,
            interest_rate: new_loan.interest_rate,
            started_at,
            ended_at,
            payment_frequency: new_loan.payment_frequency,
            total_payments,
            loan_term_days,
            installment_amount,
        };

        let schedule = (1..=total_payments)
            .map(|sequence| {
                Ok(LoanSchedule {
                    id: Uuid::new_v4(),
                    loan_id: loan.id,
                    sequence,
                    due_date: due_date(started_at, loan_term_days, sequence, total_payments)?,
                    amount_due: installment_amount,
                    status: InstallmentStatus::Unpaid,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GeneratedLoan { loan, schedule })
    }
}

/// `principal * (1 + rate) / total_payments`, rounded to amount precision
pub fn calculate_installment_amount(
    principal: Amount,
    interest_rate: Rate,
    total_payments: u32,
) -> Result<Amount> {
    if total_payments == 0 {
        return Err(BillingError::Validation {
            message: "total_payments must be greater than 0".to_string(),
        });
    }

    let overflow = || BillingError::Calculation {
        message: format!("{principal} at {interest_rate} overflows the loan total"),
    };
    let total_amount = Decimal::ONE
        .checked_add(interest_rate.as_decimal())
        .and_then(|factor| principal.as_decimal().checked_mul(factor))
        .ok_or_else(overflow)?;
    let installment = total_amount
        .checked_div(Decimal::from(total_payments))
        .ok_or_else(overflow)?;
    Amount::from_decimal(installment, principal.currency())
}

/// length of the loan term in days
pub fn loan_term_days(frequency: PaymentFrequency, total_payments: u32) -> Result<u32> {
    total_payments
        .checked_mul(frequency.days_per_period())
        .ok_or_else(|| BillingError::Calculation {
            message: format!("{total_payments} {frequency} payments overflow the loan term"),
        })
}

/// Due date of installment `sequence` using cumulative day allocation, truncated to whole days.
pub fn due_date(
    started_at: DateTime<FixedOffset>,
    loan_term_days: u32,
    sequence: u32,
    total_payments: u32,
) -> Result<DateTime<FixedOffset>> {
    let days = u64::from(loan_term_days) * u64::from(sequence) / u64::from(total_payments);
    add_days(started_at, days)
}

fn add_days(at: DateTime<FixedOffset>, days: u64) -> Result<DateTime<FixedOffset>> {
    i64::try_from(days)
        .ok()
        .and_then(Duration::try_days)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or_else(|| BillingError::Calculation {
            message: format!("{days} days after {at} is out of the supported date range"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn start() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 10, 0, 0)
            .unwrap()
    }

    fn new_loan(total_payments: u32) -> NewLoan {
        NewLoan {
            borrower_id: "borrower-id".to_string(),
            principal_amount: Amount::new(5_000_000.0).unwrap(),
            interest_rate: Rate::from_f64(0.1).unwrap(),
            payment_frequency: PaymentFrequency::Weekly,
            total_payments,
        }
    }

    #[test]
    fn test_reference_loan() {
        let generated = ScheduleGenerator::generate(&new_loan(50), start()).unwrap();
        let loan = &generated.loan;

        assert_eq!(loan.installment_amount, Amount::new(110_000.0).unwrap());
        assert_eq!(loan.loan_term_days, 350);
        assert_eq!(loan.ended_at, start() + Duration::days(350));
        assert_eq!(loan.borrower_id, "borrower-id");
        assert_eq!(generated.schedule.len(), 50);
        assert_eq!(generated.total_due().unwrap().as_decimal(), dec!(5500000));
    }

    #[test]
    fn test_schedule_shape() {
        let generated = ScheduleGenerator::generate(&new_loan(7), start()).unwrap();
        let schedule = &generated.schedule;

        let sequences: Vec<u32> = schedule.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, (1..=7).collect::<Vec<_>>());

        for pair in schedule.windows(2) {
            assert!(pair[0].due_date <= pair[1].due_date);
        }
        assert!(schedule.iter().all(|s| s.loan_id == generated.loan.id));
        assert!(schedule.iter().all(|s| s.status == InstallmentStatus::Unpaid));
        assert_eq!(schedule[0].due_date, start() + Duration::days(7));
        assert_eq!(schedule[6].due_date, generated.loan.ended_at);
    }

    #[test]
    fn test_sum_within_one_rounding_unit() {
        // 5.5M / 3 does not divide evenly
        let generated = ScheduleGenerator::generate(&new_loan(3), start()).unwrap();
        let total = generated.total_due().unwrap().as_decimal();
        let expected = dec!(5500000);
        assert!((total - expected).abs() <= dec!(0.01) * Decimal::from(3));
        assert_eq!(
            generated.loan.installment_amount.as_decimal() * Decimal::from(3),
            total
        );
    }

    #[test]
    fn test_due_dates_truncate_cumulative_days() {
        let s = start();
        // 10 days over 3 installments: 3, 6, 10
        assert_eq!(due_date(s, 10, 1, 3).unwrap(), s + Duration::days(3));
        assert_eq!(due_date(s, 10, 2, 3).unwrap(), s + Duration::days(6));
        assert_eq!(due_date(s, 10, 3, 3).unwrap(), s + Duration::days(10));
    }

    #[test]
    fn test_term_past_calendar_range_is_an_error() {
        // 350M days is far beyond the last representable date
        let err = ScheduleGenerator::generate(&new_loan(50_000_000), start()).unwrap_err();
        assert!(matches!(err, BillingError::Calculation { .. }));
        assert!(due_date(start(), u32::MAX, u32::MAX, 1).is_err());
    }

    #[test]
    fn test_total_overflow_is_an_error() {
        let new_loan = NewLoan {
            borrower_id: "borrower-id".to_string(),
            principal_amount: Amount::new(9e16).unwrap(),
            interest_rate: Rate::from_f64(1e20).unwrap(),
            payment_frequency: PaymentFrequency::Weekly,
            total_payments: 1,
        };
        let err = ScheduleGenerator::generate(&new_loan, start()).unwrap_err();
        assert!(matches!(err, BillingError::Calculation { .. }));
    }

    #[test]
    fn test_rejects_zero_payments() {
        assert!(ScheduleGenerator::generate(&new_loan(0), start()).is_err());
        assert!(calculate_installment_amount(Amount::new(1.0).unwrap(), Rate::ZERO, 0).is_err());
    }

    #[test]
    fn test_term_overflow() {
        assert!(loan_term_days(PaymentFrequency::Weekly, u32::MAX).is_err());
        assert_eq!(loan_term_days(PaymentFrequency::Weekly, 4).unwrap(), 28);
    }
}
