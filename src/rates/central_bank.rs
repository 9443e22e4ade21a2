//! Central bank key rate lookup over HTTP.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::RateServiceConfig;
use crate::decimal::Rate;
use crate::errors::{CalculatorError, Result};

use super::{RateProvider, RateQuote};

/// body returned by the rate service, rate in percent
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRateResponse {
    #[serde(alias = "keyRate")]
    pub key_rate: Decimal,
    #[serde(default, alias = "effectiveDate")]
    pub effective_date: Option<NaiveDate>,
}

/// blocking client for the key rate endpoint
pub struct CentralBankClient {
    client: Client,
    url: String,
    default_rate: Rate,
}

impl CentralBankClient {
    pub fn new(url: impl Into<String>, timeout: Duration, default_rate: Rate) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CalculatorError::InvalidConfiguration {
                message: format!("cannot build rate service client: {e}"),
            })?;

        Ok(Self {
            client,
            url: url.into(),
            default_rate,
        })
    }

    pub fn from_config(config: &RateServiceConfig) -> Result<Self> {
        Self::new(
            config.url.clone(),
            Duration::from_secs(config.timeout_secs),
            config.default_rate(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn unavailable(message: impl Into<String>) -> CalculatorError {
    CalculatorError::RateServiceUnavailable {
        message: message.into(),
    }
}

impl RateProvider for CentralBankClient {
    fn key_rate(&self) -> Result<RateQuote> {
        tracing::debug!(url = %self.url, "requesting key rate");

        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| unavailable(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("{} answered {status}", self.url)));
        }

        let body: KeyRateResponse = response
            .json()
            .map_err(|e| unavailable(format!("malformed key rate body: {e}")))?;

        let rate = Rate::from_percentage_points(body.key_rate);
        if rate.is_negative() {
            return Err(unavailable(format!("negative key rate {rate}")));
        }

        Ok(RateQuote::key_rate(rate, body.effective_date))
    }

    fn default_rate(&self) -> Rate {
        self.default_rate
    }
}
