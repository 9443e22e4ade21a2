use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculatorError {
    #[error("loan cannot be paid: monthly payment {monthly_payment} does not retire principal {principal} at {rate}")]
    CannotBePaid {
        principal: Money,
        monthly_payment: Money,
        rate: Rate,
    },

    #[error("loan cannot be paid within {max_months} months: balance {remaining} still outstanding")]
    RepaymentHorizonExceeded {
        max_months: u32,
        remaining: Money,
    },

    #[error("rate service unavailable: {message}")]
    RateServiceUnavailable {
        message: String,
    },

    #[error("invalid loan amount: {amount}")]
    InvalidLoanAmount {
        amount: Money,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl CalculatorError {
    /// both ways a loan can fail to converge
    pub fn is_cannot_be_paid(&self) -> bool {
        matches!(
            self,
            CalculatorError::CannotBePaid { .. } | CalculatorError::RepaymentHorizonExceeded { .. }
        )
    }

    /// the caller supplied a bad amount or rate
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            CalculatorError::InvalidLoanAmount { .. }
                | CalculatorError::InvalidPaymentAmount { .. }
                | CalculatorError::InvalidInterestRate { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CalculatorError>;
