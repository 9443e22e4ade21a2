use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::decimal::{Money, Rate};
use crate::errors::{CalculatorError, Result};

/// client category, decides the markup over the key rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClientType {
    #[serde(alias = "GOVERMENT", alias = "government")]
    Government,
    #[serde(alias = "business")]
    Business,
    #[serde(alias = "individual")]
    Individual,
}

impl ClientType {
    pub const ALL: [ClientType; 3] = [
        ClientType::Government,
        ClientType::Business,
        ClientType::Individual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClientType::Government => "GOVERNMENT",
            ClientType::Business => "BUSINESS",
            ClientType::Individual => "INDIVIDUAL",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientType {
    type Err = CalculatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GOVERNMENT" | "GOVERMENT" => Ok(ClientType::Government),
            "BUSINESS" => Ok(ClientType::Business),
            "INDIVIDUAL" => Ok(ClientType::Individual),
            _ => Err(CalculatorError::InvalidConfiguration {
                message: format!("unknown client type: {s}"),
            }),
        }
    }
}

/// markup added to the key rate per client type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkupTable {
    pub government: Rate,
    pub business: Rate,
    pub individual: Rate,
}

impl Default for MarkupTable {
    fn default() -> Self {
        Self {
            government: Rate::ZERO,
            business: Rate::from_percentage(1),
            individual: Rate::from_percentage(2),
        }
    }
}

impl MarkupTable {
    pub fn markup(&self, client_type: ClientType) -> Rate {
        match client_type {
            ClientType::Government => self.government,
            ClientType::Business => self.business,
            ClientType::Individual => self.individual,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for client_type in ClientType::ALL {
            let rate = self.markup(client_type);
            if rate.is_negative() {
                return Err(CalculatorError::InvalidInterestRate { rate });
            }
        }
        // government <= business <= individual
        if self.government > self.business || self.business > self.individual {
            return Err(CalculatorError::InvalidConfiguration {
                message: format!(
                    "markups must not decrease from government to individual, got {} / {} / {}",
                    self.government, self.business, self.individual
                ),
            });
        }
        Ok(())
    }
}

/// how often interest is charged on the outstanding balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccrualPeriod {
    /// interest once a year, twelve monthly payments per period
    #[default]
    Annual,
    /// interest every month, one payment per period
    Monthly,
}

impl AccrualPeriod {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            AccrualPeriod::Annual => 1,
            AccrualPeriod::Monthly => 12,
        }
    }

    pub fn months_per_period(&self) -> u32 {
        12 / self.periods_per_year()
    }
}

impl FromStr for AccrualPeriod {
    type Err = CalculatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "annual" | "yearly" => Ok(AccrualPeriod::Annual),
            "monthly" => Ok(AccrualPeriod::Monthly),
            _ => Err(CalculatorError::InvalidConfiguration {
                message: format!("unknown accrual period: {s}"),
            }),
        }
    }
}

/// a single overpayment question
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    pub principal: Money,
    pub monthly_payment: Money,
    pub client_type: ClientType,
}

impl LoanRequest {
    pub fn new(principal: Money, monthly_payment: Money, client_type: ClientType) -> Self {
        Self {
            principal,
            monthly_payment,
            client_type,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() {
            return Err(CalculatorError::InvalidLoanAmount {
                amount: self.principal,
            });
        }
        if !self.monthly_payment.is_positive() {
            return Err(CalculatorError::InvalidPaymentAmount {
                amount: self.monthly_payment,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_markups() {
        let table = MarkupTable::default();
        assert_eq!(table.markup(ClientType::Government), Rate::ZERO);
        assert_eq!(table.markup(ClientType::Business), Rate::from_percentage(1));
        assert_eq!(table.markup(ClientType::Individual), Rate::from_percentage(2));
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_markups_must_not_decrease() {
        let flat = MarkupTable {
            government: Rate::from_percentage(1),
            business: Rate::from_percentage(1),
            individual: Rate::from_percentage(1),
        };
        assert!(flat.validate().is_ok());

        let inverted = MarkupTable {
            business: Rate::from_percentage(5),
            ..MarkupTable::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(CalculatorError::InvalidConfiguration { .. })
        ));

        let government_above = MarkupTable {
            government: Rate::from_percentage(3),
            ..MarkupTable::default()
        };
        assert!(government_above.validate().is_err());
    }

    #[test]
    fn test_client_type_parsing() {
        assert_eq!("government".parse::<ClientType>().unwrap(), ClientType::Government);
        assert_eq!("GOVERMENT".parse::<ClientType>().unwrap(), ClientType::Government);
        assert_eq!("Business".parse::<ClientType>().unwrap(), ClientType::Business);
        assert_eq!("INDIVIDUAL".parse::<ClientType>().unwrap(), ClientType::Individual);
        assert!("bank".parse::<ClientType>().is_err());
    }

    #[test]
    fn test_client_type_serde() {
        let json = serde_json::to_string(&ClientType::Business).unwrap();
        assert_eq!(json, "\"BUSINESS\"");

        let legacy: ClientType = serde_json::from_str("\"GOVERMENT\"").unwrap();
        assert_eq!(legacy, ClientType::Government);
    }

    #[test]
    fn test_accrual_period() {
        assert_eq!(AccrualPeriod::default(), AccrualPeriod::Annual);
        assert_eq!(AccrualPeriod::Annual.months_per_period(), 12);
        assert_eq!(AccrualPeriod::Monthly.months_per_period(), 1);
        assert_eq!("monthly".parse::<AccrualPeriod>().unwrap(), AccrualPeriod::Monthly);
    }

    #[test]
    fn test_loan_request_validation() {
        let ok = LoanRequest::new(Money::from_major(1000), Money::from_major(100), ClientType::Business);
        assert!(ok.validate().is_ok());

        let no_principal = LoanRequest::new(Money::ZERO, Money::from_major(100), ClientType::Business);
        assert!(matches!(
            no_principal.validate(),
            Err(CalculatorError::InvalidLoanAmount { .. })
        ));

        let negative_payment =
            LoanRequest::new(Money::from_major(1000), Money::from_major(-5), ClientType::Business);
        assert!(matches!(
            negative_payment.validate(),
            Err(CalculatorError::InvalidPaymentAmount { .. })
        ));
    }

    #[test]
    fn test_loan_request_json() {
        let request: LoanRequest = serde_json::from_str(
            r#"{"principal": 100000, "monthlyPayment": "10000", "clientType": "INDIVIDUAL"}"#,
        )
        .unwrap();
        assert_eq!(request.principal, Money::from_major(100_000));
        assert_eq!(request.monthly_payment, Money::from_major(10_000));
        assert_eq!(request.client_type, ClientType::Individual);
    }
}
