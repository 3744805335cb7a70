use chrono::{DateTime, FixedOffset};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use tracing::Dispatch;

use crate::balance;
use crate::config::BillingConfig;
use crate::decimal::Amount;
use crate::delinquency::{DelinquencyAssessment, DelinquencyEvaluator};
use crate::errors::{BillingError, Result};
use crate::loan::{Loan, LoanSchedule, NewLoan};
use crate::payments::{self, LoanLocks, ScheduleGenerator, Settlement};
use crate::store::{require_loan, LoanStore};
use crate::time::local_now;
use crate::types::LoanId;

/// Loan billing facade: origination, balance queries, delinquency and settlement.
///
/// Holds no per-loan state beyond the settlement locks; everything else lives in the store.
pub struct BillingEngine<S: LoanStore> {
    store: S,
    config: BillingConfig,
    timezone: FixedOffset,
    evaluator: DelinquencyEvaluator,
    locks: LoanLocks,
    dispatch: Dispatch,
}

impl<S: LoanStore> BillingEngine<S> {
    pub fn new(store: S, config: BillingConfig) -> Result<Self> {
        config.validate()?;
        let timezone = config.timezone()?;
        let evaluator = DelinquencyEvaluator::new(config.delinquency_threshold);

        Ok(Self {
            store,
            config,
            timezone,
            evaluator,
            locks: LoanLocks::new(),
            dispatch: Dispatch::none(),
        })
    }

    /// route this engine's logs to `dispatch`
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn timezone(&self) -> &FixedOffset {
        &self.timezone
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn logged<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    fn now(&self, time_provider: &SafeTimeProvider) -> DateTime<FixedOffset> {
        local_now(time_provider, &self.timezone)
    }

    fn find_loan(&self, loan_id: LoanId) -> Result<Loan> {
        require_loan(&self.store, loan_id).map_err(|e| {
            tracing::warn!(loan_id = %loan_id, error = %e, "failed to get loan");
            e
        })
    }

    /// originate a loan and persist it with its full schedule
    pub fn create_loan(&self, new_loan: NewLoan, time_provider: &SafeTimeProvider) -> Result<Loan> {
        self.logged(|| {
            if new_loan.principal_amount.currency() != self.config.currency {
                return Err(BillingError::CurrencyMismatch {
                    left: new_loan.principal_amount.currency(),
                    right: self.config.currency,
                });
            }

            let generated = ScheduleGenerator::generate(&new_loan, self.now(time_provider))?;

            if let Err(e) = self.store.create_loan(&generated.loan, &generated.schedule) {
                tracing::warn!(error = %e, borrower_id = %new_loan.borrower_id, "failed to create loan");
                return Err(e.into());
            }

            let loan = generated.loan;
            tracing::info!(
                loan_id = %loan.id,
                borrower_id = %loan.borrower_id,
                principal = %loan.principal_amount,
                installment = %loan.installment_amount,
                total_payments = loan.total_payments,
                "loan originated"
            );
            Ok(loan)
        })
    }

    pub fn create_loan_now(&self, new_loan: NewLoan) -> Result<Loan> {
        self.create_loan(new_loan, &SafeTimeProvider::new(TimeSource::System))
    }

    pub fn get_loan(&self, loan_id: LoanId) -> Result<Loan> {
        self.logged(|| self.find_loan(loan_id))
    }

    /// installments of a loan in sequence order
    pub fn get_schedule(&self, loan_id: LoanId) -> Result<Vec<LoanSchedule>> {
        self.logged(|| {
            self.find_loan(loan_id)?;
            self.store.get_schedules(loan_id).map_err(|e| {
                tracing::warn!(loan_id = %loan_id, error = %e, "failed to get loan schedule");
                BillingError::from(e)
            })
        })
    }

    /// total of all unpaid installments
    pub fn get_outstanding(&self, loan_id: LoanId) -> Result<Amount> {
        self.logged(|| {
            let amount = balance::outstanding(&self.store, loan_id).map_err(|e| {
                tracing::warn!(loan_id = %loan_id, error = %e, "failed to get outstanding loan");
                e
            })?;
            tracing::debug!(loan_id = %loan_id, outstanding = %amount, "outstanding computed");
            Ok(amount)
        })
    }

    /// total of unpaid installments already past due
    pub fn get_total_pending(
        &self,
        loan_id: LoanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Amount> {
        self.logged(|| {
            let as_of = self.now(time_provider);
            let amount = balance::pending(&self.store, loan_id, as_of).map_err(|e| {
                tracing::warn!(loan_id = %loan_id, error = %e, "failed to get pending loan");
                e
            })?;
            tracing::debug!(loan_id = %loan_id, pending = %amount, as_of = %as_of, "pending computed");
            Ok(amount)
        })
    }

    pub fn get_total_pending_now(&self, loan_id: LoanId) -> Result<Amount> {
        self.get_total_pending(loan_id, &SafeTimeProvider::new(TimeSource::System))
    }

    pub fn assess_delinquency(
        &self,
        loan_id: LoanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<DelinquencyAssessment> {
        self.logged(|| {
            let now = self.now(time_provider);
            let assessment = self.evaluator.assess(&self.store, loan_id, now).map_err(|e| {
                tracing::warn!(loan_id = %loan_id, error = %e, "failed to assess delinquency");
                e
            })?;
            tracing::debug!(
                loan_id = %loan_id,
                missed_periods = assessment.missed_periods,
                delinquent = assessment.delinquent,
                "delinquency assessed"
            );
            Ok(assessment)
        })
    }

    pub fn is_delinquent(&self, loan_id: LoanId, time_provider: &SafeTimeProvider) -> Result<bool> {
        self.assess_delinquency(loan_id, time_provider)
            .map(|assessment| assessment.delinquent)
    }

    pub fn is_delinquent_now(&self, loan_id: LoanId) -> Result<bool> {
        self.is_delinquent(loan_id, &SafeTimeProvider::new(TimeSource::System))
    }

    /// Settle the exact pending amount and mark every due installment paid.
    ///
    /// Calls for the same loan are serialized. Repeating a successful payment fails with a
    /// mismatch because nothing is pending anymore.
    pub fn pay_loan(
        &self,
        loan_id: LoanId,
        amount: Amount,
        time_provider: &SafeTimeProvider,
    ) -> Result<Settlement> {
        self.logged(|| {
            self.find_loan(loan_id)?;
            let as_of = self.now(time_provider);

            let settlement = self
                .locks
                .with_lock(loan_id, || payments::settle(&self.store, loan_id, amount, as_of))
                .map_err(|e| {
                    match &e {
                        BillingError::PaymentAmountMismatch { submitted, pending } => {
                            tracing::warn!(
                                loan_id = %loan_id,
                                pay_amount = %submitted,
                                pending_amount = %pending,
                                "payment amount mismatch"
                            );
                        }
                        _ => tracing::warn!(loan_id = %loan_id, error = %e, "failed to pay loan"),
                    }
                    e
                })?;

            tracing::info!(
                loan_id = %loan_id,
                amount = %settlement.amount_paid,
                installments_paid = settlement.installments_paid,
                "loan payment settled"
            );
            Ok(settlement)
        })
    }

    pub fn pay_loan_now(&self, loan_id: LoanId, amount: Amount) -> Result<Settlement> {
        self.pay_loan(loan_id, amount, &SafeTimeProvider::new(TimeSource::System))
    }
}
