pub mod calculator;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod rates;
pub mod routes;
pub mod schedule;
pub mod server;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// re-export key types
pub use calculator::{CalculatorSettings, OverpaymentCalculator, OverpaymentReport};
pub use config::{AppConfig, ConfigError};
pub use decimal::{Money, Rate};
pub use errors::{CalculatorError, Result};
pub use rates::{
    resolve_rate, CentralBankClient, FixedRateProvider, RateProvider, RateQuote, RateSource,
};
pub use schedule::{RepaymentPeriod, RepaymentSchedule};
pub use types::{AccrualPeriod, ClientType, LoanRequest, MarkupTable};

// re-export external dependencies that users will need
pub use rust_decimal::Decimal;
