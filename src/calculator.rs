use serde::Serialize;

use crate::decimal::{Money, Rate};
use crate::errors::{CalculatorError, Result};
use crate::rates::{resolve_rate, RateProvider, RateQuote, RateSource};
use crate::schedule::RepaymentSchedule;
use crate::types::{AccrualPeriod, ClientType, LoanRequest, MarkupTable};

/// hundred years
pub const DEFAULT_MAX_MONTHS: u32 = 1200;

/// tunables of the overpayment calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculatorSettings {
    pub accrual_period: AccrualPeriod,
    pub max_months: u32,
    pub markups: MarkupTable,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            accrual_period: AccrualPeriod::Annual,
            max_months: DEFAULT_MAX_MONTHS,
            markups: MarkupTable::default(),
        }
    }
}

impl CalculatorSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_months < self.accrual_period.months_per_period() {
            return Err(CalculatorError::InvalidConfiguration {
                message: format!(
                    "max_months {} is shorter than one {:?} accrual period",
                    self.max_months, self.accrual_period
                ),
            });
        }
        self.markups.validate()
    }
}

/// full breakdown of one calculation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverpaymentReport {
    pub request: LoanRequest,
    pub rate: RateQuote,
    pub markup: Rate,
    pub effective_rate: Rate,
    pub overpayment: Money,
    pub total_paid: Money,
    pub term_months: u32,
    pub schedule: RepaymentSchedule,
}

/// computes total interest paid over the life of a loan
pub struct OverpaymentCalculator<P> {
    provider: P,
    settings: CalculatorSettings,
}

impl<P: RateProvider> OverpaymentCalculator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            settings: CalculatorSettings::default(),
        }
    }

    pub fn with_settings(provider: P, settings: CalculatorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { provider, settings })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> &CalculatorSettings {
        &self.settings
    }

    /// total overpayment for a loan, fails with `CannotBePaid` when the payment never retires it
    pub fn calculate(
        &self,
        principal: Money,
        monthly_payment: Money,
        client_type: ClientType,
    ) -> Result<Money> {
        let request = LoanRequest::new(principal, monthly_payment, client_type);
        self.calculate_report(&request).map(|report| report.overpayment)
    }

    pub fn calculate_report(&self, request: &LoanRequest) -> Result<OverpaymentReport> {
        request.validate()?;

        let quote = resolve_rate(&self.provider);
        let markup = self.markup_for(&quote, request.client_type);
        let effective_rate = quote
            .rate
            .checked_add(markup)
            .ok_or(CalculatorError::InvalidInterestRate { rate: quote.rate })?;

        let schedule = RepaymentSchedule::generate(
            request.principal,
            request.monthly_payment,
            effective_rate,
            self.settings.accrual_period,
            self.settings.max_months,
        )
        .inspect_err(|err| {
            tracing::debug!(
                client_type = %request.client_type,
                rate = %effective_rate,
                error = %err,
                "loan rejected"
            );
        })?;

        tracing::debug!(
            client_type = %request.client_type,
            rate = %effective_rate,
            periods = schedule.period_count(),
            overpayment = %schedule.total_interest,
            "overpayment calculated"
        );

        Ok(OverpaymentReport {
            request: *request,
            rate: quote,
            markup,
            effective_rate,
            overpayment: schedule.total_interest,
            total_paid: schedule.total_paid,
            term_months: schedule.term_months(),
            schedule,
        })
    }

    /// the default rate is an all-in credit rate, only the key rate gets a markup
    fn markup_for(&self, quote: &RateQuote, client_type: ClientType) -> Rate {
        match quote.source {
            RateSource::KeyRate => self.settings.markups.markup(client_type),
            RateSource::Default => Rate::ZERO,
        }
    }
}
