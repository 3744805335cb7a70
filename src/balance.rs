use chrono::{DateTime, FixedOffset};

use crate::decimal::{Amount, Currency};
use crate::errors::Result;
use crate::loan::LoanSchedule;
use crate::store::{require_loan, LoanStore};
use crate::types::LoanId;

/// Sum of every unpaid installment, whatever its due date.
pub fn outstanding_total(schedule: &[LoanSchedule], currency: Currency) -> Result<Amount> {
    sum_where(schedule, currency, LoanSchedule::is_unpaid)
}

/// Sum of unpaid installments due strictly before `as_of`; the amount owed right now.
pub fn pending_total(
    schedule: &[LoanSchedule],
    currency: Currency,
    as_of: DateTime<FixedOffset>,
) -> Result<Amount> {
    sum_where(schedule, currency, |row| row.is_pending(as_of))
}

fn sum_where<F>(schedule: &[LoanSchedule], currency: Currency, include: F) -> Result<Amount>
where
    F: Fn(&LoanSchedule) -> bool,
{
    schedule
        .iter()
        .filter(|row| include(row))
        .try_fold(Amount::zero(currency), |acc, row| acc.checked_add(&row.amount_due))
}

/// Outstanding balance of an existing loan.
pub fn outstanding<S: LoanStore + ?Sized>(store: &S, loan_id: LoanId) -> Result<Amount> {
    require_loan(store, loan_id)?;
    Ok(store.get_outstanding(loan_id)?)
}

/// Pending balance of an existing loan as of `as_of`.
pub fn pending<S: LoanStore + ?Sized>(
    store: &S,
    loan_id: LoanId,
    as_of: DateTime<FixedOffset>,
) -> Result<Amount> {
    require_loan(store, loan_id)?;
    Ok(store.get_total_pending(loan_id, as_of)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InstallmentStatus;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn row(
        due_date: DateTime<FixedOffset>,
        amount: f64,
        status: InstallmentStatus,
        sequence: u32,
    ) -> LoanSchedule {
        LoanSchedule {
            id: Uuid::new_v4(),
            loan_id: Uuid::nil(),
            sequence,
            due_date,
            amount_due: Amount::new(amount).unwrap(),
            status,
        }
    }

    #[test]
    fn test_outstanding_and_pending() {
        let now = FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 2, 1, 12, 0, 0)
            .unwrap();
        let schedule = vec![
            row(now - Duration::days(14), 50.0, InstallmentStatus::Paid, 1),
            row(now - Duration::days(7), 50.0, InstallmentStatus::Unpaid, 2),
            row(now - Duration::seconds(1), 50.0, InstallmentStatus::Unpaid, 3),
            row(now, 50.0, InstallmentStatus::Unpaid, 4),
            row(now + Duration::days(7), 50.25, InstallmentStatus::Unpaid, 5),
        ];

        let outstanding = outstanding_total(&schedule, Currency::Idr).unwrap();
        assert_eq!(outstanding.as_decimal(), dec!(200.25));

        let pending = pending_total(&schedule, Currency::Idr, now).unwrap();
        assert_eq!(pending.as_decimal(), dec!(100));
    }

    #[test]
    fn test_empty_schedule_is_zero() {
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 2, 1, 0, 0, 0)
            .unwrap();
        assert!(outstanding_total(&[], Currency::Idr).unwrap().is_zero());
        assert!(pending_total(&[], Currency::Idr, now).unwrap().is_zero());
    }
}
