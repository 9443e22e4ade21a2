//! Service configuration
//!
//! Loaded from a TOML file, then overridden by `OVERPAYMENT_*` environment
//! variables, then by command line flags, and validated last.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::calculator::{CalculatorSettings, DEFAULT_MAX_MONTHS};
use crate::decimal::{Money, Rate};
use crate::types::{AccrualPeriod, ClientType, LoanRequest, MarkupTable};

pub const ENV_HOST: &str = "OVERPAYMENT_HOST";
pub const ENV_PORT: &str = "OVERPAYMENT_PORT";
pub const ENV_LOG_LEVEL: &str = "OVERPAYMENT_LOG_LEVEL";
pub const ENV_RATE_SERVICE_URL: &str = "OVERPAYMENT_RATE_SERVICE_URL";
pub const ENV_RATE_TIMEOUT_SECS: &str = "OVERPAYMENT_RATE_TIMEOUT_SECS";
pub const ENV_DEFAULT_RATE: &str = "OVERPAYMENT_DEFAULT_RATE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid port number: {0}, must be between 1 and 65535")]
    InvalidPort(String),

    #[error("invalid log level: {0}, must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("invalid rate service url {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("configuration file error: {0}")]
    FileError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// filter string for `tracing_subscriber::EnvFilter`
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// key rate service settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateServiceConfig {
    pub url: String,
    pub timeout_secs: u64,
    /// fallback credit rate in percent
    #[serde(rename = "default_rate")]
    pub default_rate_percent: Decimal,
    /// skip the http service and always use the default rate
    pub offline: bool,
}

impl Default for RateServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8090/api/v1/key-rate".to_string(),
            timeout_secs: 5,
            default_rate_percent: dec!(30),
            offline: false,
        }
    }
}

impl RateServiceConfig {
    pub fn default_rate(&self) -> Rate {
        Rate::from_percentage_points(self.default_rate_percent)
    }
}

/// client markups in percentage points
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    pub government: Decimal,
    pub business: Decimal,
    pub individual: Decimal,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            government: dec!(0),
            business: dec!(1),
            individual: dec!(2),
        }
    }
}

impl MarkupConfig {
    pub fn to_table(&self) -> MarkupTable {
        MarkupTable {
            government: Rate::from_percentage_points(self.government),
            business: Rate::from_percentage_points(self.business),
            individual: Rate::from_percentage_points(self.individual),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub accrual_period: AccrualPeriod,
    pub max_months: u32,
    pub markups: MarkupConfig,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            accrual_period: AccrualPeriod::Annual,
            max_months: DEFAULT_MAX_MONTHS,
            markups: MarkupConfig::default(),
        }
    }
}

/// inputs behind `GET /overpayment`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub principal: Money,
    pub monthly_payment: Money,
    pub client_type: ClientType,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            principal: Money::from_major(100_000),
            monthly_payment: Money::from_major(10_000),
            client_type: ClientType::Government,
        }
    }
}

impl DemoConfig {
    pub fn request(&self) -> LoanRequest {
        LoanRequest::new(self.principal, self.monthly_payment, self.client_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    pub rate_service: RateServiceConfig,
    pub calculator: CalculatorConfig,
    pub demo: DemoConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: LogLevel::Info,
            rate_service: RateServiceConfig::default(),
            calculator: CalculatorConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

/// command line overrides
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub rate_service_url: Option<String>,
    pub offline: bool,
}

fn invalid_value(key: &str, message: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::FileError(e.to_string()))
    }

    /// apply environment overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// apply overrides from any key lookup, used by tests
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(&level)?;
        }
        if let Some(url) = lookup(ENV_RATE_SERVICE_URL) {
            self.rate_service.url = url;
        }
        if let Some(timeout) = lookup(ENV_RATE_TIMEOUT_SECS) {
            self.rate_service.timeout_secs = timeout
                .parse()
                .map_err(|e| invalid_value(ENV_RATE_TIMEOUT_SECS, e))?;
        }
        if let Some(rate) = lookup(ENV_DEFAULT_RATE) {
            self.rate_service.default_rate_percent =
                Decimal::from_str(&rate).map_err(|e| invalid_value(ENV_DEFAULT_RATE, e))?;
        }
        Ok(())
    }

    pub fn merge_with_cli(&mut self, cli: &CliArgs) -> Result<(), ConfigError> {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(level) = &cli.log_level {
            self.log_level = LogLevel::from_str(level)?;
        }
        if let Some(url) = &cli.rate_service_url {
            self.rate_service.url = url.clone();
        }
        if cli.offline {
            self.rate_service.offline = true;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port.to_string()));
        }

        if !self.rate_service.offline {
            reqwest::Url::parse(&self.rate_service.url).map_err(|e| ConfigError::InvalidUrl {
                url: self.rate_service.url.clone(),
                message: e.to_string(),
            })?;
        }
        if self.rate_service.timeout_secs == 0 {
            return Err(invalid_value("rate_service.timeout_secs", "must be positive"));
        }
        if self.rate_service.default_rate_percent < Decimal::ZERO {
            return Err(invalid_value("rate_service.default_rate", "must not be negative"));
        }

        self.calculator_settings()
            .validate()
            .map_err(|e| invalid_value("calculator", e))?;
        self.demo
            .request()
            .validate()
            .map_err(|e| invalid_value("demo", e))?;

        Ok(())
    }

    pub fn calculator_settings(&self) -> CalculatorSettings {
        CalculatorSettings {
            accrual_period: self.calculator.accrual_period,
            max_months: self.calculator.max_months,
            markups: self.calculator.markups.to_table(),
        }
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// file, then environment, then command line
pub fn build_config(cli: &CliArgs) -> Result<AppConfig, ConfigError> {
    let mut config = match &cli.config_file {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    config.apply_env()?;
    config.merge_with_cli(cli)?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.rate_service.default_rate(), Rate::from_percentage(30));
        assert_eq!(config.calculator.max_months, 1200);
        assert_eq!(config.demo.request().principal, Money::from_major(100_000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("Warn").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("loud").is_err());
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_toml_deserialization() {
        let config = AppConfig::from_toml_str(
            r#"
            host = "127.0.0.1"
            port = 3000
            log_level = "debug"

            [rate_service]
            url = "http://bank.example/key-rate"
            timeout_secs = 2
            default_rate = 25.5

            [calculator]
            accrual_period = "monthly"
            max_months = 600

            [calculator.markups]
            business = 1.5

            [demo]
            principal = 50000
            monthly_payment = "2500"
            client_type = "INDIVIDUAL"
            "#,
        )
        .unwrap();

        assert_eq!(config.socket_addr(), "127.0.0.1:3000");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.rate_service.timeout_secs, 2);
        assert_eq!(config.rate_service.default_rate(), Rate::from_percentage_points(dec!(25.5)));

        let settings = config.calculator_settings();
        assert_eq!(settings.accrual_period, AccrualPeriod::Monthly);
        assert_eq!(settings.max_months, 600);
        assert_eq!(settings.markups.business, Rate::from_percentage_points(dec!(1.5)));
        assert_eq!(settings.markups.individual, Rate::from_percentage(2));

        assert_eq!(config.demo.monthly_payment, Money::from_major(2_500));
        assert_eq!(config.demo.client_type, ClientType::Individual);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml_str("port = 9000").unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.calculator.accrual_period, AccrualPeriod::Annual);
    }

    #[test]
    fn test_bad_toml_is_file_error() {
        let result = AppConfig::from_toml_str("log_level = \"loud\"");
        assert!(matches!(result, Err(ConfigError::FileError(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_HOST, "10.0.0.1"),
            (ENV_PORT, "9999"),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_RATE_SERVICE_URL, "http://rates.internal/key"),
            (ENV_DEFAULT_RATE, "27.5"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env_with(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.socket_addr(), "10.0.0.1:9999");
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.rate_service.url, "http://rates.internal/key");
        assert_eq!(config.rate_service.default_rate_percent, dec!(27.5));
    }

    #[test]
    fn test_env_bad_port() {
        let mut config = AppConfig::default();
        let result = config.apply_env_with(|key| (key == ENV_PORT).then(|| "http".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidPort(_))));
    }

    #[test]
    fn test_cli_args_merge() {
        let mut config = AppConfig::default();
        let cli = CliArgs {
            host: Some("192.168.1.1".to_string()),
            port: Some(9000),
            log_level: Some("debug".to_string()),
            rate_service_url: Some("http://localhost:1234/rate".to_string()),
            offline: true,
            config_file: None,
        };

        config.merge_with_cli(&cli).unwrap();

        assert_eq!(config.host, "192.168.1.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.rate_service.url, "http://localhost:1234/rate");
        assert!(config.rate_service.offline);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AppConfig::default();
        config.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPort(_))));

        let mut config = AppConfig::default();
        config.rate_service.url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        // url is not used offline
        config.rate_service.offline = true;
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.rate_service.default_rate_percent = dec!(-1);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut config = AppConfig::default();
        config.calculator.markups.business = dec!(-1);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut config = AppConfig::default();
        config.calculator.markups.business = dec!(5);
        config.calculator.markups.individual = dec!(2);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));

        let mut config = AppConfig::default();
        config.demo.monthly_payment = Money::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidPort("0".to_string());
        assert!(err.to_string().contains("invalid port"));

        let err = ConfigError::InvalidLogLevel("loud".to_string());
        assert!(err.to_string().contains("invalid log level"));
    }
}
