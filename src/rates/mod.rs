pub mod central_bank;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::decimal::Rate;
use crate::errors::{CalculatorError, Result};

pub use central_bank::{CentralBankClient, KeyRateResponse};

/// where the rate used for a calculation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RateSource {
    /// published key rate, client markup applies
    KeyRate,
    /// fallback credit rate, applied as is
    Default,
}

/// a resolved annual rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    pub rate: Rate,
    pub source: RateSource,
    pub effective_date: Option<NaiveDate>,
}

impl RateQuote {
    pub fn key_rate(rate: Rate, effective_date: Option<NaiveDate>) -> Self {
        Self {
            rate,
            source: RateSource::KeyRate,
            effective_date,
        }
    }

    pub fn fallback(rate: Rate) -> Self {
        Self {
            rate,
            source: RateSource::Default,
            effective_date: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::Default
    }
}

/// source of the annual key rate
pub trait RateProvider: Send + Sync {
    /// current key rate; `RateServiceUnavailable` when the source cannot be reached
    fn key_rate(&self) -> Result<RateQuote>;

    /// credit rate used when the key rate is unavailable
    fn default_rate(&self) -> Rate;

    /// false for providers that run on the default rate on purpose
    fn expects_key_rate(&self) -> bool {
        true
    }
}

impl<P: RateProvider + ?Sized> RateProvider for Box<P> {
    fn key_rate(&self) -> Result<RateQuote> {
        (**self).key_rate()
    }

    fn default_rate(&self) -> Rate {
        (**self).default_rate()
    }

    fn expects_key_rate(&self) -> bool {
        (**self).expects_key_rate()
    }
}

impl<P: RateProvider + ?Sized> RateProvider for Arc<P> {
    fn key_rate(&self) -> Result<RateQuote> {
        (**self).key_rate()
    }

    fn default_rate(&self) -> Rate {
        (**self).default_rate()
    }

    fn expects_key_rate(&self) -> bool {
        (**self).expects_key_rate()
    }
}

/// ask the provider once, substituting the default rate on failure
pub fn resolve_rate<P: RateProvider + ?Sized>(provider: &P) -> RateQuote {
    match provider.key_rate() {
        Ok(quote) => {
            tracing::debug!(rate = %quote.rate, "key rate received");
            quote
        }
        Err(err) => {
            let fallback = provider.default_rate();
            if provider.expects_key_rate() {
                tracing::warn!(error = %err, fallback = %fallback, "key rate unavailable, using default rate");
            } else {
                tracing::debug!(fallback = %fallback, "no key rate source, using default rate");
            }
            RateQuote::fallback(fallback)
        }
    }
}

/// in-process provider with a fixed key rate
#[derive(Debug, Clone)]
pub struct FixedRateProvider {
    key_rate: Option<Rate>,
    default_rate: Rate,
}

impl FixedRateProvider {
    pub fn new(key_rate: Rate, default_rate: Rate) -> Self {
        Self {
            key_rate: Some(key_rate),
            default_rate,
        }
    }

    /// provider whose key rate lookup always fails
    pub fn unavailable(default_rate: Rate) -> Self {
        Self {
            key_rate: None,
            default_rate,
        }
    }
}

impl RateProvider for FixedRateProvider {
    fn key_rate(&self) -> Result<RateQuote> {
        self.key_rate
            .map(|rate| RateQuote::key_rate(rate, None))
            .ok_or_else(|| CalculatorError::RateServiceUnavailable {
                message: "no key rate configured".to_string(),
            })
    }

    fn default_rate(&self) -> Rate {
        self.default_rate
    }

    fn expects_key_rate(&self) -> bool {
        self.key_rate.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uses_key_rate() {
        let provider = FixedRateProvider::new(Rate::from_percentage(10), Rate::from_percentage(30));
        let quote = resolve_rate(&provider);

        assert_eq!(quote.rate, Rate::from_percentage(10));
        assert_eq!(quote.source, RateSource::KeyRate);
        assert!(!quote.is_fallback());
    }

    #[test]
    fn test_resolve_falls_back_on_failure() {
        let provider = FixedRateProvider::unavailable(Rate::from_percentage(30));
        assert!(matches!(
            provider.key_rate(),
            Err(CalculatorError::RateServiceUnavailable { .. })
        ));

        let quote = resolve_rate(&provider);
        assert_eq!(quote.rate, Rate::from_percentage(30));
        assert!(quote.is_fallback());
        assert_eq!(quote.effective_date, None);
    }

    #[test]
    fn test_boxed_provider_delegates() {
        let provider: Box<dyn RateProvider> =
            Box::new(FixedRateProvider::new(Rate::from_percentage(7), Rate::from_percentage(30)));

        assert_eq!(provider.default_rate(), Rate::from_percentage(30));
        assert_eq!(resolve_rate(&provider).rate, Rate::from_percentage(7));
        assert!(provider.expects_key_rate());
    }

    #[test]
    fn test_offline_provider_does_not_expect_key_rate() {
        let provider: Arc<dyn RateProvider> =
            Arc::new(FixedRateProvider::unavailable(Rate::from_percentage(30)));

        assert!(!provider.expects_key_rate());
        assert!(resolve_rate(&provider).is_fallback());
    }
}
