use rust_decimal::Decimal;
use serde::Serialize;

use crate::decimal::{Money, Rate};
use crate::errors::{CalculatorError, Result};
use crate::types::AccrualPeriod;

/// one accrual period of the repayment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentPeriod {
    pub period_number: u32,
    pub opening_balance: Money,
    pub interest: Money,
    pub payment: Money,
    pub closing_balance: Money,
    pub cumulative_interest: Money,
}

/// period-by-period repayment of a loan with a fixed monthly payment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepaymentSchedule {
    pub principal: Money,
    pub monthly_payment: Money,
    pub annual_rate: Rate,
    pub accrual_period: AccrualPeriod,
    pub periods: Vec<RepaymentPeriod>,
    pub total_interest: Money,
    pub total_paid: Money,
}

impl RepaymentSchedule {
    /// Run the repayment until the balance is retired.
    ///
    /// Each period the balance grows by `balance * annual_rate / periods_per_year`
    /// and shrinks by the monthly payments falling into that period, never
    /// below zero. Fails with `CannotBePaid` when a period's interest eats
    /// the whole installment or the amounts outgrow `Decimal`, and with
    /// `RepaymentHorizonExceeded` when the balance is still open after `max_months`.
    pub fn generate(
        principal: Money,
        monthly_payment: Money,
        annual_rate: Rate,
        accrual_period: AccrualPeriod,
        max_months: u32,
    ) -> Result<Self> {
        if annual_rate.is_negative() {
            return Err(CalculatorError::InvalidInterestRate { rate: annual_rate });
        }

        let cannot_be_paid = || CalculatorError::CannotBePaid {
            principal,
            monthly_payment,
            rate: annual_rate,
        };

        let period_rate = annual_rate.period_rate(accrual_period.periods_per_year());
        let installment = monthly_payment
            .checked_mul(Decimal::from(accrual_period.months_per_period()))
            .ok_or(CalculatorError::InvalidPaymentAmount {
                amount: monthly_payment,
            })?;
        let max_periods = max_months / accrual_period.months_per_period();

        let mut balance = principal;
        let mut cumulative_interest = Money::ZERO;
        let mut total_paid = Money::ZERO;
        let mut periods = Vec::new();

        while balance.is_positive() {
            if periods.len() as u32 >= max_periods {
                return Err(CalculatorError::RepaymentHorizonExceeded {
                    max_months,
                    remaining: balance,
                });
            }

            let interest = balance.checked_accrue(period_rate).ok_or_else(cannot_be_paid)?;
            // balance can only shrink while interest stays below the installment
            if interest >= installment {
                return Err(cannot_be_paid());
            }

            let owed = balance.checked_add(interest).ok_or_else(cannot_be_paid)?;
            let payment = installment.min(owed);
            let closing_balance = owed - payment;

            cumulative_interest = cumulative_interest
                .checked_add(interest)
                .ok_or_else(cannot_be_paid)?;
            total_paid = total_paid.checked_add(payment).ok_or_else(cannot_be_paid)?;
            periods.push(RepaymentPeriod {
                period_number: periods.len() as u32 + 1,
                opening_balance: balance,
                interest,
                payment,
                closing_balance,
                cumulative_interest,
            });

            balance = closing_balance;
        }

        Ok(Self {
            principal,
            monthly_payment,
            annual_rate,
            accrual_period,
            periods,
            total_interest: cumulative_interest,
            total_paid,
        })
    }

    pub fn period_count(&self) -> u32 {
        self.periods.len() as u32
    }

    /// months covered by the schedule, counting the last period in full
    pub fn term_months(&self) -> u32 {
        self.period_count() * self.accrual_period.months_per_period()
    }

    pub fn get_period(&self, period_number: u32) -> Option<&RepaymentPeriod> {
        period_number
            .checked_sub(1)
            .and_then(|index| self.periods.get(index as usize))
    }

    /// Remaining balance after `period_number`.
    ///
    /// Period 0 is the principal; periods past the end of the schedule are
    /// paid off.
    pub fn balance_after_period(&self, period_number: u32) -> Money {
        match self.get_period(period_number) {
            Some(period) => period.closing_balance,
            None if period_number == 0 => self.principal,
            None => Money::ZERO,
        }
    }
}
